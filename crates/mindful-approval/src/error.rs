use mindful_storage::StorageError;

/// Errors raised by the approval ledger.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The durable schedule could not be read or written.
    #[error("schedule storage error: {0}")]
    Storage(#[from] StorageError),

    /// An approval window of zero length was requested.
    #[error("approval window must be longer than zero")]
    EmptyWindow,
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
