use std::sync::OnceLock;

use genoflow_core::{
    gf_net, Annotations, GraphError, GraphResult, NetId, PlaceId, TransitionId, TypeTag,
};

use super::place::Place;
use super::transition::Transition;
use crate::job::{JobLinks, JobRef};

/// Cached boundary of the net: id-sorted sources and sinks.
#[derive(Debug, Default)]
pub(super) struct Boundary {
    pub(super) sources: Vec<PlaceId>,
    pub(super) sinks: Vec<PlaceId>,
}

/// A Petri net of typed places and Job-carrying transitions.
#[derive(Debug)]
pub struct PetriNet {
    pub(super) id: NetId,
    pub(super) places: Vec<Place>,
    pub(super) transitions: Vec<Transition>,
    pub(super) prepared: bool,
    pub(super) annotations: Annotations,
    /// Empty when dirty; filled lazily by `sources()`/`sinks()`.
    pub(super) boundary: OnceLock<Boundary>,
}

impl Default for PetriNet {
    fn default() -> Self {
        Self::new()
    }
}

impl PetriNet {
    /// Create an empty, unprepared net.
    pub fn new() -> Self {
        Self {
            id: NetId::next(),
            places: Vec::new(),
            transitions: Vec::new(),
            prepared: false,
            annotations: Annotations::new(),
            boundary: OnceLock::new(),
        }
    }

    pub fn id(&self) -> NetId {
        self.id
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn place(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(id.index())
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(id.index())
    }

    pub fn producer_of(&self, place: PlaceId) -> Option<TransitionId> {
        self.place(place).and_then(Place::producer)
    }

    pub fn consumers_of(&self, place: PlaceId) -> &[TransitionId] {
        self.place(place).map(Place::consumers).unwrap_or(&[])
    }

    /// Annotations attached to this net and its nodes.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Annotations stay writable after `prepare()`; they are not structure.
    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    /// Append a new place of the given type.
    pub fn create_place(&mut self, type_tag: TypeTag) -> GraphResult<PlaceId> {
        self.push_place(type_tag, None)
    }

    /// Append a new place with a label used in logs.
    pub fn create_labeled_place(
        &mut self,
        type_tag: TypeTag,
        label: impl Into<String>,
    ) -> GraphResult<PlaceId> {
        self.push_place(type_tag, Some(label.into()))
    }

    /// Append a new transition running `job`.
    pub fn create_transition(&mut self, job: JobRef) -> GraphResult<TransitionId> {
        self.ensure_mutable()?;
        let id = TransitionId(self.transitions.len() as u64);
        self.transitions.push(Transition::new(id, job));
        self.invalidate();
        Ok(id)
    }

    /// Wire `place` into input slot `index` of `transition`.
    pub fn connect_input(
        &mut self,
        place: PlaceId,
        transition: TransitionId,
        index: usize,
    ) -> GraphResult<()> {
        self.ensure_mutable()?;
        let place_tag = self.place_checked(place)?.type_tag.clone();
        let t = self.transition_checked(transition)?;

        let arity = t.arity();
        if index >= arity {
            return Err(GraphError::SlotOutOfRange {
                transition,
                index,
                arity,
            });
        }
        if let Some(existing) = t.inputs[index] {
            return Err(GraphError::SlotAlreadyWired {
                transition,
                index,
                place: existing,
            });
        }
        let expected = &t.job.input_types()[index];
        if !expected.accepts(&place_tag) {
            return Err(GraphError::TypeMismatch {
                location: format!("{place} -> {transition}[{index}]"),
                expected: expected.clone(),
                found: place_tag,
            });
        }

        self.transitions[transition.index()].inputs[index] = Some(place);
        self.places[place.index()].add_consumer(transition);
        self.invalidate();
        Ok(())
    }

    /// Wire the output of `transition` into `place`.
    pub fn connect_output(&mut self, transition: TransitionId, place: PlaceId) -> GraphResult<()> {
        self.ensure_mutable()?;
        let p = self.place_checked(place)?;
        let t = self.transition_checked(transition)?;

        if let Some(existing) = t.output {
            return Err(GraphError::OutputAlreadyWired {
                transition,
                place: existing,
            });
        }
        if let Some(existing) = p.producer {
            return Err(GraphError::DuplicateProducer { place, existing });
        }
        let produced = t.job.output_type();
        if !p.type_tag.accepts(produced) {
            return Err(GraphError::TypeMismatch {
                location: format!("{transition} -> {place}"),
                expected: p.type_tag.clone(),
                found: produced.clone(),
            });
        }

        self.transitions[transition.index()].output = Some(place);
        self.places[place.index()].producer = Some(transition);
        self.invalidate();
        Ok(())
    }

    /// Finalize the structure.
    ///
    /// Creates a place for every unwired input slot and output (typed from
    /// the Job), hands every Job its upstream and downstream neighbours, and
    /// freezes the net. Preparing a prepared net is a no-op.
    pub fn prepare(&mut self) -> GraphResult<()> {
        if self.prepared {
            return Ok(());
        }

        for t_index in 0..self.transitions.len() {
            let transition = self.transitions[t_index].id;
            let job = self.transitions[t_index].job.clone();

            for (slot, tag) in job.input_types().iter().enumerate() {
                if self.transitions[t_index].inputs[slot].is_none() {
                    let place = self.create_place(tag.clone())?;
                    self.connect_input(place, transition, slot)?;
                }
            }
            if self.transitions[t_index].output.is_none() {
                let place = self.create_place(job.output_type().clone())?;
                self.connect_output(transition, place)?;
            }
        }

        for transition in &self.transitions {
            let links = self.links_of(transition);
            transition.job.on_prepare(&links);
        }

        self.prepared = true;

        gf_net!(debug,
            net = %self.id,
            places = self.places.len(),
            transitions = self.transitions.len(),
            "Net prepared"
        );
        Ok(())
    }

    fn links_of(&self, transition: &Transition) -> JobLinks {
        let upstream = transition
            .inputs()
            .map(|place| {
                self.producer_of(place)
                    .and_then(|producer| self.transition(producer))
                    .map(|t| t.job.clone())
            })
            .collect();
        let downstream = transition
            .output
            .map(|place| {
                self.consumers_of(place)
                    .iter()
                    .filter_map(|&consumer| self.transition(consumer))
                    .map(|t| t.job.clone())
                    .collect()
            })
            .unwrap_or_default();

        JobLinks {
            transition: transition.id,
            upstream,
            downstream,
        }
    }

    fn push_place(&mut self, type_tag: TypeTag, label: Option<String>) -> GraphResult<PlaceId> {
        self.ensure_mutable()?;
        let id = PlaceId(self.places.len() as u64);
        self.places.push(Place::new(id, type_tag, label));
        self.invalidate();
        Ok(id)
    }

    fn ensure_mutable(&self) -> GraphResult<()> {
        if self.prepared {
            Err(GraphError::AlreadyPrepared)
        } else {
            Ok(())
        }
    }

    fn place_checked(&self, id: PlaceId) -> GraphResult<&Place> {
        self.place(id).ok_or(GraphError::UnknownPlace(id))
    }

    fn transition_checked(&self, id: TransitionId) -> GraphResult<&Transition> {
        self.transition(id).ok_or(GraphError::UnknownTransition(id))
    }

    /// Mark the cached boundary dirty.
    pub(super) fn invalidate(&mut self) {
        self.boundary = OnceLock::new();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{add_job, int_to_string_job, RecordingJob};

    #[test]
    fn test_create_and_connect() {
        let mut net = PetriNet::new();
        let a = net.create_place(TypeTag::Integer).unwrap();
        let b = net.create_place(TypeTag::Integer).unwrap();
        let t = net.create_transition(add_job()).unwrap();

        net.connect_input(a, t, 0).unwrap();
        net.connect_input(b, t, 1).unwrap();

        let transition = net.transition(t).unwrap();
        assert_eq!(transition.input(0), Some(a));
        assert_eq!(transition.input(1), Some(b));
        assert_eq!(net.consumers_of(a), &[t]);
        assert!(net.producer_of(a).is_none());
    }

    #[test]
    fn test_slot_errors() {
        let mut net = PetriNet::new();
        let a = net.create_place(TypeTag::Integer).unwrap();
        let t = net.create_transition(add_job()).unwrap();

        assert_eq!(
            net.connect_input(a, t, 2),
            Err(GraphError::SlotOutOfRange {
                transition: t,
                index: 2,
                arity: 2
            })
        );

        net.connect_input(a, t, 0).unwrap();
        assert!(matches!(
            net.connect_input(a, t, 0),
            Err(GraphError::SlotAlreadyWired { index: 0, .. })
        ));
    }

    #[test]
    fn test_type_mismatch_on_input() {
        let mut net = PetriNet::new();
        let s = net.create_place(TypeTag::String).unwrap();
        let t = net.create_transition(add_job()).unwrap();

        let err = net.connect_input(s, t, 0).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
    }

    #[test]
    fn test_type_mismatch_on_output() {
        let mut net = PetriNet::new();
        let out = net.create_place(TypeTag::Integer).unwrap();
        let t = net.create_transition(int_to_string_job()).unwrap();

        let err = net.connect_output(t, out).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));

        let any = net.create_place(TypeTag::Any).unwrap();
        assert!(net.connect_output(t, any).is_ok());
    }

    #[test]
    fn test_second_producer_fails() {
        let mut net = PetriNet::new();
        let shared = net.create_place(TypeTag::Integer).unwrap();
        let t1 = net.create_transition(add_job()).unwrap();
        let t2 = net.create_transition(add_job()).unwrap();

        net.connect_output(t1, shared).unwrap();
        assert_eq!(
            net.connect_output(t2, shared),
            Err(GraphError::DuplicateProducer {
                place: shared,
                existing: t1
            })
        );

        let other = net.create_place(TypeTag::Integer).unwrap();
        assert!(matches!(
            net.connect_output(t1, other),
            Err(GraphError::OutputAlreadyWired { .. })
        ));
    }

    #[test]
    fn test_prepare_fills_slots_and_freezes() {
        let mut net = PetriNet::new();
        let a = net.create_place(TypeTag::Integer).unwrap();
        let t = net.create_transition(add_job()).unwrap();
        net.connect_input(a, t, 0).unwrap();

        net.prepare().unwrap();
        assert!(net.is_prepared());

        for transition in net.transitions() {
            assert_eq!(transition.arity(), transition.job().arity());
            assert!(transition.is_fully_wired());
        }
        let created = net.transition(t).unwrap().input(1).unwrap();
        assert_eq!(net.place(created).unwrap().type_tag(), &TypeTag::Integer);

        assert_eq!(
            net.create_place(TypeTag::Integer),
            Err(GraphError::AlreadyPrepared)
        );
        assert!(net.create_transition(add_job()).is_err());
        assert_eq!(net.connect_input(a, t, 0), Err(GraphError::AlreadyPrepared));

        // idempotent
        net.prepare().unwrap();
    }

    #[test]
    fn test_prepare_hands_out_links() {
        let upstream = Arc::new(RecordingJob::new("upstream", 0));
        let downstream = Arc::new(RecordingJob::new("downstream", 1));

        let mut net = PetriNet::new();
        let t1 = net.create_transition(upstream.clone()).unwrap();
        let t2 = net.create_transition(downstream.clone()).unwrap();
        let mid = net.create_place(TypeTag::Integer).unwrap();
        net.connect_output(t1, mid).unwrap();
        net.connect_input(mid, t2, 0).unwrap();
        net.prepare().unwrap();

        let up_links = upstream.links();
        assert_eq!(up_links.len(), 1);
        assert_eq!(up_links[0].transition, t1);
        assert!(up_links[0].upstream.is_empty());
        assert_eq!(up_links[0].downstream.len(), 1);
        assert_eq!(up_links[0].downstream[0].name(), "downstream");

        let down_links = downstream.links();
        assert_eq!(down_links[0].upstream.len(), 1);
        assert_eq!(
            down_links[0].upstream[0].as_ref().map(|j| j.name().to_string()),
            Some("upstream".to_string())
        );
        assert!(down_links[0].downstream.is_empty());
    }

    #[test]
    fn test_unknown_ids() {
        let mut net = PetriNet::new();
        let t = net.create_transition(add_job()).unwrap();
        assert_eq!(
            net.connect_input(PlaceId(9), t, 0),
            Err(GraphError::UnknownPlace(PlaceId(9)))
        );
        let p = net.create_place(TypeTag::Integer).unwrap();
        assert_eq!(
            net.connect_output(TransitionId(4), p),
            Err(GraphError::UnknownTransition(TransitionId(4)))
        );
    }
}
