//! Petri-net graph: places, transitions and the net that owns them.
//!
//! A net is built by creating places and transitions and wiring edges, then
//! frozen with [`PetriNet::prepare`]. Prepared nets are immutable and can be
//! shared (behind an `Arc`) by any number of execution contexts.

mod petri_net;
mod place;
mod surgery;
mod topology;
mod transition;

pub use petri_net::PetriNet;
pub use place::Place;
pub use surgery::NetMapping;
pub use transition::Transition;
