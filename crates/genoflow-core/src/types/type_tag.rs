//! Declared types for places and Job signatures.
//!
//! Type tags are checked when edges are wired, so a mismatched graph is
//! rejected at build time rather than when a Job first runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type descriptor attached to places and Job inputs/outputs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Carries no data. Void inputs never gate readiness.
    Void,
    /// Any non-void value.
    Any,
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Integer or float.
    Number,
    /// UTF-8 string.
    String,
    /// Homogeneous array.
    Array(Box<TypeTag>),
    /// String-keyed object.
    Object,
    /// Nominal collaborator type (e.g. `"GenomicRegionSet"`), carried as an object.
    Named(String),
}

impl TypeTag {
    /// Array of the given element type.
    pub fn array_of(element: TypeTag) -> Self {
        TypeTag::Array(Box::new(element))
    }

    /// Nominal type with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        TypeTag::Named(name.into())
    }

    /// Returns true for [`TypeTag::Void`].
    pub fn is_void(&self) -> bool {
        matches!(self, TypeTag::Void)
    }

    /// Whether a slot declared with `self` can receive values of type `provided`.
    pub fn accepts(&self, provided: &TypeTag) -> bool {
        if self == provided {
            return true;
        }
        match (self, provided) {
            (TypeTag::Any, other) => !other.is_void(),
            (TypeTag::Number, TypeTag::Integer | TypeTag::Float) => true,
            (TypeTag::Array(expected), TypeTag::Array(found)) => expected.accepts(found),
            _ => false,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Void => write!(f, "void"),
            TypeTag::Any => write!(f, "any"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Integer => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Number => write!(f, "number"),
            TypeTag::String => write!(f, "string"),
            TypeTag::Array(inner) => write!(f, "array<{}>", inner),
            TypeTag::Object => write!(f, "object"),
            TypeTag::Named(name) => write!(f, "{}", name),
        }
    }
}
