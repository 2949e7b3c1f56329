use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::command::Command;
use crate::error::{CommandError, InstallError, InstallFailure, Result};
use crate::kind::{FileKind, extension_of};

/// Launches a distribution's own installer.
pub trait DistributionInstaller: Send + Sync {
    /// Starts installing `file`.
    ///
    /// Returns `Err` only when the format is rejected up front. Launch
    /// failures come back as `Ok(false)`; with `wait` the result also
    /// reflects the installer's exit status.
    fn install(&self, file: &Path, destination: Option<&Path>, wait: bool) -> Result<bool>;
}

/// Runs `.exe` installers directly and `.msi` packages through `msiexec`.
///
/// The installer's working directory is the directory holding the file.
/// `destination` is passed to MSI packages as `TARGETDIR` and ignored for
/// executables, which choose their own location.
#[derive(Debug)]
pub struct WindowsExecutableInstaller {
    msiexec:  PathBuf,
    failures: Mutex<Vec<InstallFailure>>,
}

impl Default for WindowsExecutableInstaller {
    fn default() -> Self { Self::new() }
}

impl WindowsExecutableInstaller {
    pub const MSIEXEC: &'static str = "msiexec";

    pub fn new() -> Self {
        Self {
            msiexec:  PathBuf::from(Self::MSIEXEC),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Program used to open `.msi` packages.
    pub fn msiexec(mut self, program: impl Into<PathBuf>) -> Self {
        self.msiexec = program.into();
        self
    }

    /// Message of the most recent failure, if any is retained.
    pub fn last_failure(&self) -> Option<String> {
        self.lock_failures().last().map(ToString::to_string)
    }

    pub fn failure_count(&self) -> usize { self.lock_failures().len() }

    /// Drains the retained failures, oldest first.
    pub fn take_failures(&self) -> Vec<InstallFailure> { std::mem::take(&mut *self.lock_failures()) }

    fn lock_failures(&self) -> MutexGuard<'_, Vec<InstallFailure>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, file: &Path, source: CommandError) -> bool {
        tracing::warn!(file = %file.display(), error = %source, "installer did not succeed");
        self.lock_failures().push(InstallFailure {
            file: file.to_path_buf(),
            source,
        });
        false
    }

    pub(crate) fn command_for(&self, file: &Path, extension: &str, destination: Option<&Path>) -> Command {
        let workdir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let command = if extension.eq_ignore_ascii_case("msi") {
            let command = Command::new(&self.msiexec).arg("/i").arg(file);
            match destination {
                Some(dest) => {
                    let mut target = std::ffi::OsString::from("TARGETDIR=");
                    target.push(dest);
                    command.arg(target)
                }
                None => command,
            }
        } else {
            Command::new(file)
        };
        command.current_dir(workdir)
    }
}

impl DistributionInstaller for WindowsExecutableInstaller {
    fn install(&self, file: &Path, destination: Option<&Path>, wait: bool) -> Result<bool> {
        let kind = FileKind::from_path(file);
        let extension = extension_of(file).unwrap_or_default();
        if kind != FileKind::WindowsExecutable {
            return Err(InstallError::UnsupportedFormat {
                path: file.to_path_buf(),
                extension,
                kind,
            });
        }

        let file = match std::path::absolute(file) {
            Ok(file) => file,
            Err(source) => {
                return Ok(self.record(file, CommandError::Spawn {
                    cmd: file.display().to_string(),
                    source,
                }));
            }
        };

        let mut command = self.command_for(&file, &extension, destination);
        tracing::debug!(program = command.program(), file = %file.display(), wait, "launching installer");

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => return Ok(self.record(&file, err)),
        };

        if !wait {
            return Ok(true);
        }

        let outcome = child
            .wait()
            .map_err(|source| CommandError::Wait {
                cmd: command.program().to_string(),
                source,
            })
            .and_then(|status| command.check(status));

        match outcome {
            Ok(()) => {
                tracing::debug!(file = %file.display(), "installer finished");
                Ok(true)
            }
            Err(err) => Ok(self.record(&file, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_windows_formats() {
        let installer = WindowsExecutableInstaller::new();
        for name in ["/tmp/dist/tool.zip", "/tmp/dist/tool.pkg", "/tmp/dist/tool", "/tmp/dist/tool.exe.txt"] {
            let err = installer.install(Path::new(name), None, true).unwrap_err();
            assert!(matches!(err, InstallError::UnsupportedFormat { .. }), "{name}");
        }
        assert_eq!(installer.failure_count(), 0);
    }

    #[test]
    fn test_exe_command() {
        let installer = WindowsExecutableInstaller::new();
        let cmd = installer.command_for(Path::new("/tmp/dist/setup.exe"), "exe", Some(Path::new("/opt/x")));
        assert_eq!(cmd.program(), Path::new("/tmp/dist/setup.exe").display().to_string());
        assert_eq!(cmd.get_args().count(), 0);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp/dist")));
    }

    #[cfg(unix)]
    #[test]
    fn test_msi_command() {
        let installer = WindowsExecutableInstaller::new();
        let cmd = installer.command_for(Path::new("/tmp/dist/pkg.msi"), "MSI", Some(Path::new("/opt/pkg")));
        assert_eq!(cmd.program(), "msiexec");
        assert_eq!(
            cmd.get_args().collect::<Vec<_>>(),
            ["/i", "/tmp/dist/pkg.msi", "TARGETDIR=/opt/pkg"]
        );

        let cmd = installer.command_for(Path::new("pkg.msi"), "msi", None);
        assert_eq!(cmd.get_args().count(), 2);
        assert_eq!(cmd.get_current_dir(), Some(Path::new(".")));
    }

    #[test]
    fn test_spawn_failure_is_retained() {
        let installer = WindowsExecutableInstaller::new().msiexec("carton_no_such_msiexec_12345");
        let launched = installer
            .install(Path::new("/tmp/carton-missing/pkg.msi"), None, true)
            .unwrap();

        assert!(!launched);
        assert_eq!(installer.failure_count(), 1);
        assert!(installer.last_failure().unwrap().contains("pkg.msi"));
        let failures = installer.take_failures();
        assert!(matches!(failures[0].source, CommandError::Spawn { .. }));
        assert_eq!(installer.failure_count(), 0);
    }
}
