use thiserror::Error;

/// Failure reported by a [`DataSource`](crate::source::DataSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Page {0} is out of range")]
    PageOutOfRange(u32),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt cache entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Failed to load data: {0}")]
    Fetch(#[from] FetchError),

    #[error("List controller has shut down")]
    Closed,
}

/// Maximum length for error detail in user-visible notices
const MAX_NOTICE_DETAIL_LENGTH: usize = 120;

impl ControllerError {
    /// Short message suitable for an alert shown to the user.
    pub fn notice(&self) -> String {
        let detail = self.to_string();
        if detail.chars().count() <= MAX_NOTICE_DETAIL_LENGTH {
            detail
        } else {
            let truncated: String = detail.chars().take(MAX_NOTICE_DETAIL_LENGTH).collect();
            format!("{}...", truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_converts_into_controller_error() {
        let err: ControllerError = FetchError::Unavailable("offline".to_string()).into();
        assert_eq!(err.notice(), "Failed to load data: Data source unavailable: offline");
    }

    #[test]
    fn test_notice_truncates_long_detail() {
        let err = ControllerError::Fetch(FetchError::Unavailable("x".repeat(500)));
        let notice = err.notice();
        assert!(notice.ends_with("..."));
        assert_eq!(notice.chars().count(), MAX_NOTICE_DETAIL_LENGTH + 3);
    }
}
