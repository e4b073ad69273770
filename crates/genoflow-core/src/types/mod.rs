//! Core value and identity types.

mod ids;
mod meta;
mod type_tag;
mod value;

pub use ids::{NetId, NodeKey, NodeKind, PlaceId, TransitionId};
pub use meta::TokenMeta;
pub use type_tag::TypeTag;
pub use value::{Number, Value};
