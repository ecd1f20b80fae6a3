// 🚨 Error Taxonomy
// Validation failures are the caller's fault, store failures are ours.

use thiserror::Error;

/// A required request parameter is missing or malformed.
///
/// Always detected before any query reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Month is required")]
    MissingMonth,

    #[error("Month must be in YYYY-MM format, got '{0}'")]
    MalformedMonth(String),

    #[error("Month and year are required")]
    MissingMonthOrYear,

    #[error("Year must be a whole number, got '{0}'")]
    MalformedYear(String),

    #[error("Month is required and should be between 1 and 12")]
    MonthOutOfRange,

    #[error("Year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
}

/// The record store failed to execute a query.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store connection lock poisoned")]
    Poisoned,

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Error returned by every report operation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ReportError::Validation(_))
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_client_facing() {
        assert_eq!(ValidationError::MissingMonth.to_string(), "Month is required");
        assert_eq!(
            ValidationError::MissingMonthOrYear.to_string(),
            "Month and year are required"
        );
        assert_eq!(
            ValidationError::MonthOutOfRange.to_string(),
            "Month is required and should be between 1 and 12"
        );
    }

    #[test]
    fn test_report_error_classification() {
        let err: ReportError = ValidationError::MissingMonth.into();
        assert!(err.is_validation());

        let err: ReportError = StoreError::Poisoned.into();
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "store connection lock poisoned");
    }
}
