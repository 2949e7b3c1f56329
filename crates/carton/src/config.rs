use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use carton_fetch::{ClientOptions, FetchOptions, SmbAuth};
use carton_fs::{DEFAULT_EXTENSION, RegistryOptions};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "carton.toml";
pub const ENV_PREFIX: &str = "CARTON_";

/// Settings merged from defaults, `carton.toml` and `CARTON_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub temp:      TempConfig,
    pub http:      HttpConfig,
    pub smb:       SmbConfig,
    pub install:   InstallConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempConfig {
    /// Overrides the OS temp root.
    pub root:              Option<PathBuf>,
    pub default_extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent:           String,
    /// `0` disables the timeout.
    pub connect_timeout_secs: u64,
    pub max_retries:          u32,
    pub retry_backoff_ms:     u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmbConfig {
    pub mount_root: Option<PathBuf>,
    pub domain:     Option<String>,
    pub login:      Option<String>,
    pub password:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub wait: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            temp:      TempConfig::default(),
            http:      HttpConfig::default(),
            smb:       SmbConfig::default(),
            install:   InstallConfig::default(),
        }
    }
}

impl Default for TempConfig {
    fn default() -> Self {
        Self {
            root:              None,
            default_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        let client = ClientOptions::new();
        Self {
            user_agent:           client.get_user_agent().to_string(),
            connect_timeout_secs: client.get_connect_timeout().map_or(0, |t| t.as_secs()),
            max_retries:          2,
            retry_backoff_ms:     200,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self { Self { wait: true } }
}

impl Config {
    /// Loads the layered configuration.
    ///
    /// An explicit `path` must exist; the default `carton.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => bail!("config file {} not found", path.display()),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };
        Self::figment(&file)
            .extract()
            .with_context(|| format!("invalid configuration (file {})", file.display()))
    }

    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions::new()
            .maybe_root(self.temp.root.clone())
            .default_extension(&self.temp.default_extension)
    }

    pub fn client_options(&self) -> ClientOptions {
        let timeout = (self.http.connect_timeout_secs > 0)
            .then(|| Duration::from_secs(self.http.connect_timeout_secs));
        ClientOptions::new()
            .user_agent(&self.http.user_agent)
            .connect_timeout(timeout)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .max_retries(self.http.max_retries)
            .retry_backoff(Duration::from_millis(self.http.retry_backoff_ms))
    }

    /// Credential for shares whose locator carries none; anonymous without a login.
    pub fn smb_auth(&self) -> SmbAuth {
        match &self.smb.login {
            Some(login) => SmbAuth::ntlm(
                self.smb.domain.clone(),
                login.clone(),
                self.smb.password.clone().unwrap_or_default(),
            ),
            None => SmbAuth::Anonymous,
        }
    }
}
