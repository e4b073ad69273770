use std::fmt;

use genoflow_core::{PlaceId, TransitionId};

use crate::job::JobRef;

/// A Job wired to input places and one output place.
///
/// The number of input slots is fixed by the Job's arity. Slots may be left
/// empty while the net is being built; [`PetriNet::prepare`] fills them.
///
/// [`PetriNet::prepare`]: super::PetriNet::prepare
#[derive(Clone)]
pub struct Transition {
    pub(super) id: TransitionId,
    pub(super) job: JobRef,
    pub(super) inputs: Vec<Option<PlaceId>>,
    pub(super) output: Option<PlaceId>,
}

impl Transition {
    pub(super) fn new(id: TransitionId, job: JobRef) -> Self {
        let arity = job.arity();
        Self {
            id,
            job,
            inputs: vec![None; arity],
            output: None,
        }
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn job(&self) -> &JobRef {
        &self.job
    }

    pub fn job_name(&self) -> &str {
        self.job.name()
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// Place wired to input slot `index`.
    pub fn input(&self, index: usize) -> Option<PlaceId> {
        self.inputs.get(index).copied().flatten()
    }

    /// Raw input slots, including unwired ones.
    pub fn input_slots(&self) -> &[Option<PlaceId>] {
        &self.inputs
    }

    /// Wired input places in slot order.
    pub fn inputs(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.inputs.iter().flatten().copied()
    }

    pub fn output(&self) -> Option<PlaceId> {
        self.output
    }

    /// Every input slot and the output are wired.
    pub fn is_fully_wired(&self) -> bool {
        self.output.is_some() && self.inputs.iter().all(Option::is_some)
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.id)
            .field("job", &self.job.name())
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish()
    }
}
