//! genoflow runtime - Petri-net dataflow engine for genomics pipelines
//!
//! The runtime provides:
//! - **Net**: typed places, Job-carrying transitions, preparation, topology
//!   queries and structural surgery (masked clones, sink extraction)
//! - **Execution**: per-run token state with generations, cancellation and
//!   an annotation channel; incremental ready tracking; transition firing
//! - **Scheduler**: a tokio reference driver with semaphore backpressure
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use genoflow_core::{TypeTag, Value};
//! use genoflow_runtime::{ExecutionContext, NetRunner, PetriNet, RunnerConfig, UnaryJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut net = PetriNet::new();
//!     let reads = net.create_labeled_place(TypeTag::Integer, "reads")?;
//!     let t = net.create_transition(Arc::new(UnaryJob::new("double", |x: i64| x * 2)))?;
//!     net.connect_input(reads, t, 0)?;
//!     net.prepare()?;
//!
//!     let ctx = Arc::new(ExecutionContext::new(Arc::new(net))?);
//!     let runner = NetRunner::new(RunnerConfig::default())?;
//!     let report = runner.run(&ctx, [(reads, Value::from(21i64))]).await?;
//!     assert!(report.finished);
//!     Ok(())
//! }
//! ```

pub mod execution;
pub mod job;
pub mod net;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use execution::{
    complete_firing, ExecutionContext, FireOutcome, FireStatus, FireTransition,
    ReadyTransitionIndex, Token, TokenWrite, TransitionState, ELAPSED_MS_ANNOTATION,
};
pub use job::{
    BinaryJob, ConstJob, FnJob, Inputs, Job, JobContext, JobLinks, JobRef, TypedValue, UnaryJob,
};
pub use net::{NetMapping, PetriNet, Place, Transition};
pub use scheduler::{ConcurrencyControl, NetRunner, RunReport, RunStats, RunnerConfig};

// Re-export commonly used core types
pub use genoflow_core::{
    EngineError, EngineResult, ExecutionError, GraphError, JobError, JobResult, NodeKey, PlaceId,
    TokenMeta, TransitionId, TypeTag, Value,
};
