//! Execution-state and annotation errors.

use thiserror::Error;

use crate::types::{PlaceId, TransitionId, TypeTag};

/// Errors raised by operations on an execution context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Token operation attempted before `start_execution()`.
    #[error("Execution has not been started")]
    NotStarted,

    /// Contexts can only be created over prepared nets.
    #[error("Net must be prepared before creating an execution context")]
    NetNotPrepared,

    /// A seeded value does not conform to the type of its place.
    #[error("Place {place} expects {expected}, got {found}")]
    TypeMismatch {
        /// Place being written.
        place: PlaceId,
        /// Type of the place.
        expected: TypeTag,
        /// Rendered offending value.
        found: String,
    },

    /// A non-void input place of a transition holds no token.
    #[error("Transition {transition} is missing a token on input {place}")]
    MissingToken {
        /// Transition whose input was requested.
        transition: TransitionId,
        /// Empty input place.
        place: PlaceId,
    },

    /// A place still needs an externally supplied value.
    #[error("Place {place} requires an input value")]
    MissingInput {
        /// Place that needs a value.
        place: PlaceId,
    },

    /// Place id does not belong to the context's net.
    #[error("Unknown place {0}")]
    UnknownPlace(PlaceId),

    /// Transition id does not belong to the context's net.
    #[error("Unknown transition {0}")]
    UnknownTransition(TransitionId),
}

/// Errors raised by the typed annotation channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    /// No annotation map with this name exists.
    #[error("Unknown annotation '{0}'")]
    Unknown(String),

    /// An annotation map with this name already exists with another type.
    #[error("Annotation '{name}' already exists with type {existing}")]
    AlreadyExists {
        /// Annotation name.
        name: String,
        /// Declared type of the existing map.
        existing: &'static str,
    },

    /// The annotation exists but was requested with a different value type.
    #[error("Annotation '{name}' holds {declared}, requested {requested}")]
    TypeMismatch {
        /// Annotation name.
        name: String,
        /// Declared value type.
        declared: &'static str,
        /// Requested value type.
        requested: &'static str,
    },
}
