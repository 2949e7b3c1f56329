use crate::data::options::FetchPhase;

/// Snapshot passed to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes written to the temp file so far.
    pub bytes_downloaded: u64,

    /// Total expected bytes, when the source announces a length.
    pub total_bytes: Option<u64>,
}

impl Progress {
    pub fn new(phase: FetchPhase, bytes_downloaded: u64, total_bytes: Option<u64>) -> Self {
        Self {
            phase,
            bytes_downloaded,
            total_bytes,
        }
    }

    /// `None` if the total is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                if self.is_completed() { 100.0 } else { 0.0 }
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }

    #[must_use]
    pub fn is_completed(&self) -> bool { self.phase == FetchPhase::Completed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(Progress::new(FetchPhase::Downloading, 50, Some(200)).percentage(), Some(25.0));
        assert_eq!(Progress::new(FetchPhase::Downloading, 50, None).percentage(), None);
    }

    #[test]
    fn test_percentage_empty_body() {
        assert_eq!(Progress::new(FetchPhase::Downloading, 0, Some(0)).percentage(), Some(0.0));
        assert_eq!(Progress::new(FetchPhase::Completed, 0, Some(0)).percentage(), Some(100.0));
    }
}
