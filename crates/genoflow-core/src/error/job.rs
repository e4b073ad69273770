//! Errors reported by Jobs.

use thiserror::Error;

use crate::types::TypeTag;

/// Error returned from a Job's `execute`.
///
/// Collaborators that already work with `anyhow` can bubble their errors up
/// through [`JobError::Other`] with `?`.
#[derive(Debug, Error)]
pub enum JobError {
    /// The computation failed.
    #[error("Job failed: {message}")]
    Failed {
        /// Failure description.
        message: String,
    },

    /// An input value did not match the declared type.
    #[error("Input {index} expected {expected}, got {found}")]
    InvalidInput {
        /// Input slot.
        index: usize,
        /// Declared input type.
        expected: TypeTag,
        /// Rendered offending value.
        found: String,
    },

    /// The produced value does not conform to the declared output type.
    #[error("Output expected {expected}, got {found}")]
    InvalidOutput {
        /// Declared output type.
        expected: TypeTag,
        /// Rendered offending value.
        found: String,
    },

    /// The firing was cancelled before the Job finished.
    #[error("Job cancelled")]
    Cancelled,

    /// Any other error raised by collaborator code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JobError {
    /// Shorthand for [`JobError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        JobError::Failed {
            message: message.into(),
        }
    }

    /// Returns true if the Job stopped because its firing was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobError::Cancelled)
    }
}
