mod cli;
mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use carton_fetch::{
    Downloader, HttpDownloader, Locator, MountedShare, Progress, ReqwestClient, SmbDownloader,
};
use carton_fs::{TempFileRegistry, TempFileSpec};
use carton_install::{DistributionInstaller, FileKind, HostOs, WindowsExecutableInstaller};
use clap::Parser;

use crate::cli::{App, Commands, FetchArgs, LaunchArgs};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();
    let config = Config::load(app.config.as_deref())?;
    logging::init(&config.log_level, app.verbose);

    let registry = TempFileRegistry::new(config.registry_options());
    // temp files still on disk when main returns are swept here
    let _guard = registry.exit_guard();

    match app.cmd {
        Commands::Fetch(args) => fetch(args, &config, &registry).await,
        Commands::Install(args) => install(args.file, args.launch, &config).await,
    }
}

async fn fetch(args: FetchArgs, config: &Config, registry: &TempFileRegistry) -> Result<()> {
    args.validate()?;
    let locator = Locator::parse(&args.locator)?;
    let client = ReqwestClient::new(&config.client_options())?;
    let share = MountedShare::new().maybe_mount_root(config.smb.mount_root.clone());
    let options = config.fetch_options().on_progress(Arc::new(log_progress));
    let downloader = Downloader::from_parts(
        HttpDownloader::new(client, registry.clone()).with_options(options.clone()),
        SmbDownloader::new(share, registry.clone())
            .default_auth(config.smb_auth())
            .with_options(options),
    );

    let spec = TempFileSpec::new(&args.name)
        .maybe_extension(args.ext.clone())
        .segments(args.dirs.iter().cloned());
    let file = downloader
        .fetch(&locator, &spec)
        .await
        .with_context(|| format!("failed to download {locator}"))?;
    println!("{}", file.path().display());

    if let Some(output) = &args.output {
        tokio::fs::copy(file.path(), output)
            .await
            .with_context(|| format!("failed to copy download to {}", output.display()))?;
    }

    if args.install {
        let target = args.install_target(file.path()).to_path_buf();
        install(target, args.launch, config).await?;
    }
    Ok(())
}

async fn install(file: PathBuf, launch: LaunchArgs, config: &Config) -> Result<()> {
    let kind = FileKind::from_path(&file);
    let host = HostOs::current();
    if !host.runs_natively(kind) {
        tracing::warn!(file = %file.display(), %kind, %host, "distribution is not native to this host");
    }

    let wait = config.install.wait && !launch.no_wait;
    let file_display = file.display().to_string();
    let (launched, failure) = tokio::task::spawn_blocking(move || {
        let installer = WindowsExecutableInstaller::new();
        let launched = installer.install(&file, launch.dest.as_deref(), wait);
        (launched, installer.last_failure())
    })
    .await
    .context("installer task panicked")?;

    if !launched? {
        bail!(failure.unwrap_or_else(|| format!("installer for {file_display} did not succeed")));
    }
    tracing::info!(file = %file_display, wait, "installer launched");
    Ok(())
}

fn log_progress(progress: &Progress) {
    match progress.percentage() {
        Some(pct) => tracing::trace!(phase = %progress.phase, bytes = progress.bytes_downloaded, "{pct:.1}%"),
        None => tracing::trace!(phase = %progress.phase, bytes = progress.bytes_downloaded),
    }
}
