//! Errors raised by the gate.

use mindful_approval::ApprovalError;
use mindful_core::TargetId;
use mindful_storage::StorageError;

/// Errors raised by the gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The settings store could not be read or written.
    #[error("settings storage error: {0}")]
    Storage(#[from] StorageError),

    /// The approval ledger failed.
    #[error("approval ledger error: {0}")]
    Approval(#[from] ApprovalError),

    /// The UI destination for a target is gone.
    #[error("target {target} is unreachable: {reason}")]
    Unreachable {
        /// The target the message was for.
        target: TargetId,
        /// Why delivery failed.
        reason: String,
    },

    /// A setting was given an unusable value.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// The controller event loop has stopped.
    #[error("gate controller is not running")]
    ControllerStopped,
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
