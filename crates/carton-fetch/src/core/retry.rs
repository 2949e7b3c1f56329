use std::time::Duration;

use crate::error::FetchError;

/// Delay before connect attempt `attempt + 1`: `base * 2^attempt`, saturating.
///
/// ```
/// use std::time::Duration;
/// use carton_fetch::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt))
}

/// Only transport-level failures are worth another connect attempt.
pub(crate) fn is_retryable(err: &FetchError) -> bool { matches!(err, FetchError::Network(_)) }
