//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use genoflow_core::{JobResult, PlaceId, TransitionId, TypeTag, Value};
use parking_lot::Mutex;

use crate::job::{BinaryJob, Inputs, Job, JobContext, JobLinks, JobRef, UnaryJob};
use crate::net::PetriNet;

pub(crate) fn inc_job() -> JobRef {
    Arc::new(UnaryJob::new("+1", |x: i64| x + 1))
}

pub(crate) fn double_job() -> JobRef {
    Arc::new(UnaryJob::new("*2", |x: i64| x * 2))
}

pub(crate) fn add_job() -> JobRef {
    Arc::new(BinaryJob::new("add", |a: i64, b: i64| a + b))
}

pub(crate) fn int_to_string_job() -> JobRef {
    Arc::new(UnaryJob::new("to-string", |x: i64| x.to_string()))
}

/// Ids of the net built by [`chain_net`].
pub(crate) struct ChainIds {
    pub a: PlaceId,
    pub b: PlaceId,
    pub c: PlaceId,
    pub t1: TransitionId,
    pub t2: TransitionId,
}

/// Prepared `a -> +1 -> b -> *2 -> c`.
pub(crate) fn chain_net() -> (PetriNet, ChainIds) {
    let mut net = PetriNet::new();
    let a = net.create_labeled_place(TypeTag::Integer, "a").unwrap();
    let b = net.create_labeled_place(TypeTag::Integer, "b").unwrap();
    let c = net.create_labeled_place(TypeTag::Integer, "c").unwrap();
    let t1 = net.create_transition(inc_job()).unwrap();
    let t2 = net.create_transition(double_job()).unwrap();
    net.connect_input(a, t1, 0).unwrap();
    net.connect_output(t1, b).unwrap();
    net.connect_input(b, t2, 0).unwrap();
    net.connect_output(t2, c).unwrap();
    net.prepare().unwrap();
    (net, ChainIds { a, b, c, t1, t2 })
}

/// Integer Job that records the links it is prepared with and sums its
/// inputs.
pub(crate) struct RecordingJob {
    name: String,
    inputs: Vec<TypeTag>,
    output: TypeTag,
    links: Mutex<Vec<JobLinks>>,
}

impl RecordingJob {
    pub(crate) fn new(name: &str, arity: usize) -> Self {
        Self {
            name: name.to_string(),
            inputs: vec![TypeTag::Integer; arity],
            output: TypeTag::Integer,
            links: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn links(&self) -> Vec<JobLinks> {
        self.links.lock().clone()
    }
}

#[async_trait]
impl Job for RecordingJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_types(&self) -> &[TypeTag] {
        &self.inputs
    }

    fn output_type(&self) -> &TypeTag {
        &self.output
    }

    async fn execute(&self, _ctx: JobContext<'_>, inputs: Inputs) -> JobResult<Value> {
        let sum: i64 = inputs.iter().filter_map(Value::as_i64).sum();
        Ok(Value::from(sum))
    }

    fn on_prepare(&self, links: &JobLinks) {
        self.links.lock().push(links.clone());
    }
}
