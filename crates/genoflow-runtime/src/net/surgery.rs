//! Structural transforms: full clone, masked clone and sink extraction.
//!
//! Every transform produces a net with a fresh [`NetId`] and carries the
//! annotations across by translating their `(kind, id)` keys.

use std::sync::OnceLock;

use genoflow_core::{gf_net, GraphError, GraphResult, NetId, NodeKey, NodeKind, PlaceId, TransitionId};

use super::petri_net::PetriNet;
use super::place::Place;
use super::transition::Transition;

/// Id translation from a source net to a derived net.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetMapping {
    places: Vec<Option<PlaceId>>,
    transitions: Vec<Option<TransitionId>>,
    origin_places: Vec<PlaceId>,
    origin_transitions: Vec<TransitionId>,
}

impl NetMapping {
    /// Id of `origin` in the derived net, if it survived.
    pub fn place(&self, origin: PlaceId) -> Option<PlaceId> {
        self.places.get(origin.index()).copied().flatten()
    }

    /// Id of `origin` in the derived net, if it survived.
    pub fn transition(&self, origin: TransitionId) -> Option<TransitionId> {
        self.transitions.get(origin.index()).copied().flatten()
    }

    /// Id in the source net of a derived place. `None` for places created
    /// while preparing the derived net.
    pub fn origin_place(&self, derived: PlaceId) -> Option<PlaceId> {
        self.origin_places.get(derived.index()).copied()
    }

    /// Id in the source net of a derived transition.
    pub fn origin_transition(&self, derived: TransitionId) -> Option<TransitionId> {
        self.origin_transitions.get(derived.index()).copied()
    }

    fn translate(&self, key: NodeKey, from: NetId, to: NetId) -> Option<NodeKey> {
        match key.kind {
            NodeKind::Net if key.id == from.0 => Some(NodeKey::net(to)),
            NodeKind::Net | NodeKind::Context => Some(key),
            NodeKind::Place => self.place(PlaceId(key.id)).map(NodeKey::from),
            NodeKind::Transition => self.transition(TransitionId(key.id)).map(NodeKey::from),
        }
    }
}

impl PetriNet {
    /// Structural deep copy with a fresh net id.
    ///
    /// Jobs are shared, not copied. Node ids are preserved; annotations keyed
    /// on the net itself move to the new net id.
    pub fn clone_net(&self) -> PetriNet {
        let id = NetId::next();
        let from = self.id;
        let annotations = self.annotations.remap_keys(|key| match key.kind {
            NodeKind::Net if key.id == from.0 => Some(NodeKey::net(id)),
            _ => Some(key),
        });

        PetriNet {
            id,
            places: self.places.clone(),
            transitions: self.transitions.clone(),
            prepared: self.prepared,
            annotations,
            boundary: OnceLock::new(),
        }
    }

    /// Selective copy keeping the masked-in nodes.
    ///
    /// Masks are indexed by id; ids beyond a mask's length count as masked
    /// out. A transition survives iff masked in. A place survives iff masked
    /// in and either its producer survives or it is a source with at least
    /// one surviving consumer. Surviving nodes are renumbered densely in id
    /// order. If this net is prepared the copy is prepared too, which creates
    /// fresh places for any slot left unwired.
    pub fn clone_masked(
        &self,
        place_mask: &[bool],
        transition_mask: &[bool],
    ) -> GraphResult<(PetriNet, NetMapping)> {
        let keep_t = |t: TransitionId| transition_mask.get(t.index()).copied().unwrap_or(false);
        let keep_p = |p: &Place| {
            place_mask.get(p.id.index()).copied().unwrap_or(false)
                && match p.producer {
                    Some(producer) => keep_t(producer),
                    None => p.consumers.iter().any(|&c| keep_t(c)),
                }
        };

        let mut mapping = NetMapping {
            places: vec![None; self.places.len()],
            transitions: vec![None; self.transitions.len()],
            ..NetMapping::default()
        };

        let mut net = PetriNet::new();
        for place in self.places.iter().filter(|p| keep_p(p)) {
            let id = PlaceId(net.places.len() as u64);
            net.places.push(Place::new(id, place.type_tag.clone(), place.label.clone()));
            mapping.places[place.id.index()] = Some(id);
            mapping.origin_places.push(place.id);
        }
        for transition in self.transitions.iter().filter(|t| keep_t(t.id)) {
            let id = TransitionId(net.transitions.len() as u64);
            net.transitions.push(Transition::new(id, transition.job.clone()));
            mapping.transitions[transition.id.index()] = Some(id);
            mapping.origin_transitions.push(transition.id);
        }

        for transition in self.transitions.iter().filter(|t| keep_t(t.id)) {
            let Some(new_t) = mapping.transition(transition.id) else {
                continue;
            };
            for (slot, input) in transition.inputs.iter().enumerate() {
                if let Some(new_p) = input.and_then(|p| mapping.place(p)) {
                    net.connect_input(new_p, new_t, slot)?;
                }
            }
            if let Some(new_p) = transition.output.and_then(|p| mapping.place(p)) {
                net.connect_output(new_t, new_p)?;
            }
        }

        let (from, to) = (self.id, net.id);
        net.annotations = self
            .annotations
            .remap_keys(|key| mapping.translate(key, from, to));

        if self.prepared {
            net.prepare()?;
        }

        gf_net!(debug,
            source = %from,
            derived = %to,
            places = net.places.len(),
            transitions = net.transitions.len(),
            "Masked clone"
        );
        Ok((net, mapping))
    }

    /// Minimal subnet that supplies `targets`.
    ///
    /// Walks backwards from `targets` through producers and their inputs and
    /// returns the masked clone of everything reached. The sinks of the
    /// result always map back into `targets`.
    pub fn extract_sink_supplying(
        &self,
        targets: &[PlaceId],
    ) -> GraphResult<(PetriNet, NetMapping)> {
        let mut place_mask = vec![false; self.places.len()];
        let mut transition_mask = vec![false; self.transitions.len()];
        let mut stack = Vec::with_capacity(targets.len());

        for &target in targets {
            if self.place(target).is_none() {
                return Err(GraphError::UnknownPlace(target));
            }
            stack.push(target);
        }

        while let Some(place) = stack.pop() {
            if std::mem::replace(&mut place_mask[place.index()], true) {
                continue;
            }
            let Some(producer) = self.producer_of(place) else {
                continue;
            };
            if std::mem::replace(&mut transition_mask[producer.index()], true) {
                continue;
            }
            stack.extend(self.transitions[producer.index()].inputs());
        }

        self.clone_masked(&place_mask, &transition_mask)
    }
}
