//! Per-run state over a prepared net, and the machinery that fires it.
//!
//! - [`ExecutionContext`]: tokens, generation, disabled set and the
//!   annotation channel of one run.
//! - [`ReadyTransitionIndex`]: incremental ready set with per-transition
//!   lifecycle states.
//! - [`FireTransition`]: a generation-bound firing of one transition.

mod context;
mod fire;
mod ready_index;

pub use context::{ExecutionContext, Token, TokenWrite};
pub use fire::{complete_firing, FireOutcome, FireStatus, FireTransition, ELAPSED_MS_ANNOTATION};
pub use ready_index::{ReadyTransitionIndex, TransitionState};
