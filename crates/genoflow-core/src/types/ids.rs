//! Node identifiers.
//!
//! Places and transitions are numbered densely per net, so an id doubles as
//! an index into the net's node vectors. Nets carry a process-unique
//! [`NetId`] so annotations can be keyed on the net itself.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier of a place within its net.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaceId(pub u64);

/// Identifier of a transition within its net.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionId(pub u64);

/// Process-unique identifier of a net.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetId(pub u64);

static NEXT_NET_ID: AtomicU64 = AtomicU64::new(1);

impl NetId {
    /// Allocate a fresh net id.
    pub fn next() -> Self {
        NetId(NEXT_NET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl PlaceId {
    /// Index into the owning net's place vector.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TransitionId {
    /// Index into the owning net's transition vector.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net{}", self.0)
    }
}

/// What kind of node an annotation key refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The net as a whole.
    Net,
    /// A place.
    Place,
    /// A transition.
    Transition,
    /// The execution context (run-global data).
    Context,
}

/// Annotation key: a `(kind, id)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    /// Node kind.
    pub kind: NodeKind,
    /// Id within that kind.
    pub id: u64,
}

impl NodeKey {
    /// Key for run-global data of an execution context.
    pub const fn context() -> Self {
        NodeKey {
            kind: NodeKind::Context,
            id: 0,
        }
    }

    /// Key for the given net.
    pub const fn net(net: NetId) -> Self {
        NodeKey {
            kind: NodeKind::Net,
            id: net.0,
        }
    }
}

impl From<PlaceId> for NodeKey {
    fn from(id: PlaceId) -> Self {
        NodeKey {
            kind: NodeKind::Place,
            id: id.0,
        }
    }
}

impl From<TransitionId> for NodeKey {
    fn from(id: TransitionId) -> Self {
        NodeKey {
            kind: NodeKind::Transition,
            id: id.0,
        }
    }
}

impl From<NetId> for NodeKey {
    fn from(id: NetId) -> Self {
        NodeKey::net(id)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Net => write!(f, "net{}", self.id),
            NodeKind::Place => write!(f, "p{}", self.id),
            NodeKind::Transition => write!(f, "t{}", self.id),
            NodeKind::Context => write!(f, "context"),
        }
    }
}
