//! Boundary and ordering queries over a net.

use genoflow_core::{PlaceId, TransitionId};

use super::petri_net::{Boundary, PetriNet};

impl PetriNet {
    /// Places without a producer, sorted by id.
    pub fn sources(&self) -> &[PlaceId] {
        &self.boundary().sources
    }

    /// Places without consumers, sorted by id.
    pub fn sinks(&self) -> &[PlaceId] {
        &self.boundary().sinks
    }

    fn boundary(&self) -> &Boundary {
        self.boundary.get_or_init(|| {
            let mut boundary = Boundary::default();
            for place in &self.places {
                if place.is_source() {
                    boundary.sources.push(place.id);
                }
                if place.is_sink() {
                    boundary.sinks.push(place.id);
                }
            }
            boundary
        })
    }

    /// Transitions in dependency order.
    ///
    /// Kahn-style: a stack is seeded with the source places (and
    /// zero-arity transitions are emitted up front). Popping a place bumps a
    /// visited counter on each consumer; once the counter reaches the
    /// consumer's arity the consumer is emitted and its output pushed.
    /// Transitions on cycles or fed by unwired slots are never emitted.
    pub fn topological_order(&self) -> Vec<TransitionId> {
        let mut visited = vec![0usize; self.transitions.len()];
        let mut order = Vec::with_capacity(self.transitions.len());
        let mut stack: Vec<PlaceId> = Vec::new();

        for transition in &self.transitions {
            if transition.arity() == 0 {
                order.push(transition.id);
                stack.extend(transition.output);
            }
        }
        // Reverse so that sources pop in id order.
        stack.extend(self.sources().iter().rev());

        while let Some(place) = stack.pop() {
            for &consumer in self.consumers_of(place) {
                let transition = &self.transitions[consumer.index()];
                // A place wired into several slots of one consumer counts once per slot.
                let slots = transition.inputs().filter(|&p| p == place).count();
                visited[consumer.index()] += slots;
                if visited[consumer.index()] == transition.arity() {
                    order.push(consumer);
                    stack.extend(transition.output);
                }
            }
        }
        order
    }
}
