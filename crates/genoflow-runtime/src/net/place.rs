use genoflow_core::{PlaceId, TransitionId, TypeTag};

/// A typed token slot.
///
/// A place holds at most one token per execution and has at most one
/// producer. Places without a producer are *sources*, places without
/// consumers are *sinks*.
#[derive(Clone, Debug)]
pub struct Place {
    pub(super) id: PlaceId,
    pub(super) type_tag: TypeTag,
    pub(super) label: Option<String>,
    pub(super) producer: Option<TransitionId>,
    pub(super) consumers: Vec<TransitionId>,
}

impl Place {
    pub(super) fn new(id: PlaceId, type_tag: TypeTag, label: Option<String>) -> Self {
        Self {
            id,
            type_tag,
            label,
            producer: None,
            consumers: Vec::new(),
        }
    }

    pub fn id(&self) -> PlaceId {
        self.id
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn producer(&self) -> Option<TransitionId> {
        self.producer
    }

    /// Consuming transitions, in wiring order, without duplicates.
    pub fn consumers(&self) -> &[TransitionId] {
        &self.consumers
    }

    pub fn is_source(&self) -> bool {
        self.producer.is_none()
    }

    pub fn is_sink(&self) -> bool {
        self.consumers.is_empty()
    }

    pub fn is_void(&self) -> bool {
        self.type_tag.is_void()
    }

    pub(super) fn add_consumer(&mut self, transition: TransitionId) {
        if !self.consumers.contains(&transition) {
            self.consumers.push(transition);
        }
    }
}
