use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;

/// Phases of a download, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Resolving the locator and opening the remote body.
    #[default]
    Connecting,

    /// Streaming bytes into the temp file.
    Downloading,

    /// The temp file holds the complete body.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Per-download behaviour.
///
/// # Examples
///
/// ```
/// use carton_fetch::{FetchOptions, Progress};
/// use std::sync::Arc;
///
/// let options = FetchOptions::default()
///     .header("Authorization", "Bearer token")
///     .max_retries(2)
///     .on_progress(Arc::new(|p: &Progress| {
///         if let Some(pct) = p.percentage() {
///             println!("{pct:.1}%");
///         }
///     }));
/// assert_eq!(options.headers.len(), 1);
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Extra request headers. Ignored by share transports.
    pub headers: Arc<[(String, String)]>,

    /// Retries of the connect step after the first attempt. A body that fails
    /// mid-stream is never retried, the partial file is reclaimed instead.
    ///
    /// Default: 0
    pub max_retries: u32,

    /// Base delay for exponential backoff between connect attempts.
    ///
    /// Default: 200ms
    pub retry_backoff: Duration,

    /// Invoked on phase transitions and after each chunk is written.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("headers", &self.headers)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers:       Arc::new([]),
            max_retries:   0,
            retry_backoff: Duration::from_millis(200),
            on_progress:   None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replaces any existing headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(callback) = &self.on_progress {
            callback(&progress);
        }
    }
}

/// Settings of the production HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    user_agent:      String,
    connect_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self { Self::new() }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self {
            user_agent:      concat!("carton/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// `None` waits as long as the OS does.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn get_user_agent(&self) -> &str { &self.user_agent }

    pub fn get_connect_timeout(&self) -> Option<Duration> { self.connect_timeout }
}
