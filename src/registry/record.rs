use std::fmt;

use crate::geometry::{BooleanOp, Boundary};

/// Stable identifier of a shape. Never reused within a registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a shape came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Primitive,
    Union,
    Intersection,
    Difference,
}

impl Provenance {
    /// Display label used for generated names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Provenance::Primitive => "Primitive",
            Provenance::Union => "Union",
            Provenance::Intersection => "Intersection",
            Provenance::Difference => "Difference",
        }
    }
}

impl From<BooleanOp> for Provenance {
    fn from(op: BooleanOp) -> Self {
        match op {
            BooleanOp::Union => Provenance::Union,
            BooleanOp::Intersection => Provenance::Intersection,
            BooleanOp::Difference => Provenance::Difference,
        }
    }
}

/// A named boundary held by the registry.
#[derive(Debug, Clone)]
pub struct ShapeRecord {
    /// Stable key.
    pub id: ShapeId,
    /// Display name, e.g. `"Rectangle 0"`.
    pub name: String,
    /// The region outline.
    pub boundary: Boundary,
    /// Primitive or the boolean operation that produced it.
    pub provenance: Provenance,
}
