//! Pure helpers shared by the downloaders.

mod retry;

pub(crate) use retry::is_retryable;
pub use retry::retry_delay;
