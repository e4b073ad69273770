//! The Job contract consumed by the engine.
//!
//! A Job is a stateless computation: a pure function of its input tuple and
//! the execution context. One Job instance may be wired into several
//! transitions and fired concurrently by many executions, so implementations
//! take `&self` only and must not keep per-call mutable state.
//!
//! Collaborators implement [`Job`] directly, or use the adapters in
//! [`adapters`] and [`typed`] for pure functions.

pub mod adapters;
pub mod typed;

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use async_trait::async_trait;
use genoflow_core::{JobError, JobResult, TokenMeta, TransitionId, TypeTag, Value};
use tokio_util::sync::CancellationToken;

use crate::execution::ExecutionContext;

pub use adapters::{ConstJob, FnJob};
pub use typed::{BinaryJob, TypedValue, UnaryJob};

/// Shared handle to a Job.
pub type JobRef = Arc<dyn Job>;

/// Capability contract for a unit of computation wired into a transition.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Human readable name used in logs and errors.
    fn name(&self) -> &str;

    /// Declared input types, one per input slot.
    fn input_types(&self) -> &[TypeTag];

    /// Declared output type.
    fn output_type(&self) -> &TypeTag;

    /// Number of input slots.
    fn arity(&self) -> usize {
        self.input_types().len()
    }

    /// Compute the output for one firing.
    ///
    /// Long-running Jobs should poll [`JobContext::is_cancelled`]; the firing
    /// is also dropped at the next await point once the run is reset.
    async fn execute(&self, ctx: JobContext<'_>, inputs: Inputs) -> JobResult<Value>;

    /// Whether this Job opts out of the given execution.
    ///
    /// Called while the ready index is locked; keep it cheap and non-blocking.
    fn is_disabled(&self, _ctx: &ExecutionContext) -> bool {
        false
    }

    /// Fold the metadata of the input tokens into the metadata of the output.
    fn cascade_meta(&self, inputs: &[TokenMeta]) -> TokenMeta {
        TokenMeta::cascade(inputs)
    }

    /// Called once per transition when the net is prepared.
    fn on_prepare(&self, _links: &JobLinks) {}
}

/// Neighbouring Jobs of a transition, handed to [`Job::on_prepare`].
#[derive(Clone)]
pub struct JobLinks {
    /// Transition the Job is wired into.
    pub transition: TransitionId,
    /// Producer Job of each input slot; `None` for source inputs.
    pub upstream: Vec<Option<JobRef>>,
    /// Consumer Jobs of the output place.
    pub downstream: Vec<JobRef>,
}

impl fmt::Debug for JobLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let upstream: Vec<Option<&str>> = self
            .upstream
            .iter()
            .map(|job| job.as_ref().map(|j| j.name()))
            .collect();
        let downstream: Vec<&str> = self.downstream.iter().map(|j| j.name()).collect();
        f.debug_struct("JobLinks")
            .field("transition", &self.transition)
            .field("upstream", &upstream)
            .field("downstream", &downstream)
            .finish()
    }
}

/// Per-firing view handed to [`Job::execute`].
pub struct JobContext<'a> {
    /// Execution the firing belongs to.
    pub execution: &'a ExecutionContext,
    /// Transition being fired.
    pub transition: TransitionId,
    /// Generation the firing was submitted under.
    pub generation: u64,
    /// Metadata cascaded from the input tokens.
    pub meta: &'a TokenMeta,
    cancel: &'a CancellationToken,
}

impl<'a> JobContext<'a> {
    pub(crate) fn new(
        execution: &'a ExecutionContext,
        transition: TransitionId,
        generation: u64,
        meta: &'a TokenMeta,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            execution,
            transition,
            generation,
            meta,
            cancel,
        }
    }

    /// True once the execution this firing belongs to has been reset.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token to hand to nested async work.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Ordered input tuple of one firing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inputs {
    values: Vec<Value>,
}

impl Inputs {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Extract input `index` as `T`.
    pub fn typed<T: TypedValue>(&self, index: usize) -> JobResult<T> {
        let invalid = |found: String| JobError::InvalidInput {
            index,
            expected: T::type_tag(),
            found,
        };
        match self.values.get(index) {
            Some(value) => T::from_value(value).ok_or_else(|| invalid(value.to_string())),
            None => Err(invalid("<missing>".to_string())),
        }
    }
}

impl Index<usize> for Inputs {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl From<Vec<Value>> for Inputs {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_typed_access() {
        let inputs = Inputs::new(vec![Value::from(7i64), Value::from("chr2")]);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.typed::<i64>(0).unwrap(), 7);
        assert_eq!(inputs.typed::<String>(1).unwrap(), "chr2");
        assert_eq!(inputs[1], Value::from("chr2"));

        let err = inputs.typed::<bool>(0).unwrap_err();
        assert!(matches!(err, JobError::InvalidInput { index: 0, .. }));

        let missing = inputs.typed::<i64>(5).unwrap_err();
        assert!(matches!(missing, JobError::InvalidInput { index: 5, .. }));
    }
}
