//! genoflow core - fundamental types shared by the Petri-net job engine.
//!
//! This crate provides the value model carried by tokens, the type tags used
//! to check wiring, node identifiers, the annotation side tables and the
//! error taxonomy. The graph and execution machinery live in
//! `genoflow-runtime`.

pub mod annotation;
pub mod error;
pub mod logging;
pub mod types;

pub use annotation::{AnnotationMap, Annotations};
pub use error::{
    AnnotationError, EngineError, EngineResult, ExecutionError, ExecutionResult, GraphError,
    GraphResult, JobError, JobResult,
};
pub use types::{NetId, NodeKey, NodeKind, Number, PlaceId, TokenMeta, TransitionId, TypeTag, Value};
