use thiserror::Error;

/// Failures of the persistence layer itself. These are never caused by
/// client input and surface as HTTP 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable booking data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("timed out waiting for the data file lock")]
    LockTimeout,
}

#[derive(Debug, Error)]
pub enum BookingError {
    /// Aggregated field violations from a booking submission.
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    /// A business rule turned the request down (past date, closed day,
    /// taken slot).
    #[error("{0}")]
    Rejected(String),

    /// The record to create already exists.
    #[error("{0}")]
    Conflict(String),

    /// The record to remove does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
