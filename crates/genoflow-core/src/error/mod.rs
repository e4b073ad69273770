//! Error handling for the genoflow engine.
//!
//! Errors are split by the phase in which they surface:
//! - [`GraphError`]: structural problems found while building a net. These
//!   fail fast and synchronously.
//! - [`ExecutionError`]: misuse of an execution context (not started, stale
//!   generation, missing tokens).
//! - [`JobError`]: whatever a Job's `execute` reports. Firings capture these
//!   on their outcome instead of halting unrelated branches.
//! - [`AnnotationError`]: misuse of the typed annotation channel.
//!
//! [`EngineError`] wraps all of them for callers that drive a whole run.

/// Errors raised while building or transforming a net.
pub mod graph;
/// Errors raised by execution contexts and the annotation channel.
pub mod execution;
/// Errors reported by Jobs and captured by firings.
pub mod job;

pub use execution::{AnnotationError, ExecutionError};
pub use graph::GraphError;
pub use job::JobError;

use thiserror::Error;

use crate::types::TransitionId;

/// Result alias for graph construction.
pub type GraphResult<T> = Result<T, GraphError>;
/// Result alias for execution-context operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
/// Result alias for Job execution.
pub type JobResult<T> = Result<T, JobError>;
/// Result alias for whole-run operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Umbrella error for operations spanning graph, execution and jobs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structural error.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Execution-state error.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Annotation channel error.
    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    /// A Job failed while firing a transition.
    #[error("Job '{job}' failed on transition {transition}: {source}")]
    Job {
        /// Transition that was firing.
        transition: TransitionId,
        /// Name of the Job.
        job: String,
        /// Underlying Job error.
        #[source]
        source: JobError,
    },

    /// Invalid runner configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Returns the transition whose Job failed, if this is a Job error.
    pub fn failed_transition(&self) -> Option<TransitionId> {
        match self {
            EngineError::Job { transition, .. } => Some(*transition),
            _ => None,
        }
    }
}
