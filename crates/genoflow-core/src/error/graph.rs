//! Graph structure errors.

use thiserror::Error;

use crate::types::{PlaceId, TransitionId, TypeTag};

/// Errors raised while wiring or transforming a Petri net.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The net was already prepared; its structure is frozen.
    #[error("Net is already prepared; structure can no longer change")]
    AlreadyPrepared,

    /// Place id does not belong to this net.
    #[error("Unknown place {0}")]
    UnknownPlace(PlaceId),

    /// Transition id does not belong to this net.
    #[error("Unknown transition {0}")]
    UnknownTransition(TransitionId),

    /// Input slot index exceeds the Job's declared arity.
    #[error("Transition {transition} has {arity} input slots, index {index} is out of range")]
    SlotOutOfRange {
        /// Transition being wired.
        transition: TransitionId,
        /// Requested slot.
        index: usize,
        /// Declared arity.
        arity: usize,
    },

    /// Input slot already wired to a place.
    #[error("Input slot {index} of transition {transition} is already wired to {place}")]
    SlotAlreadyWired {
        /// Transition being wired.
        transition: TransitionId,
        /// Slot index.
        index: usize,
        /// Place already occupying the slot.
        place: PlaceId,
    },

    /// The transition's single output edge is already wired.
    #[error("Output of transition {transition} is already wired to {place}")]
    OutputAlreadyWired {
        /// Transition being wired.
        transition: TransitionId,
        /// Place already receiving the output.
        place: PlaceId,
    },

    /// A place may have at most one producer.
    #[error("Place {place} already has producer {existing}")]
    DuplicateProducer {
        /// Place receiving a second producer.
        place: PlaceId,
        /// Current producer.
        existing: TransitionId,
    },

    /// Declared types are incompatible.
    #[error("Type mismatch at {location}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Human readable edge description.
        location: String,
        /// Type required by the receiving side.
        expected: TypeTag,
        /// Type offered by the providing side.
        found: TypeTag,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_out_of_range_display() {
        let err = GraphError::SlotOutOfRange {
            transition: TransitionId(1),
            index: 3,
            arity: 2,
        };
        assert_eq!(
            err.to_string(),
            "Transition t1 has 2 input slots, index 3 is out of range"
        );
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = GraphError::TypeMismatch {
            location: "p0 -> t1[0]".to_string(),
            expected: TypeTag::Integer,
            found: TypeTag::String,
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch at p0 -> t1[0]: expected int, found string"
        );
    }
}
