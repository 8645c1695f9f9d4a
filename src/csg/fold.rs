use crate::domain::Domain;
use crate::error::Result;
use crate::geometry::BooleanOp;
use crate::kernel::MeshKernel;
use crate::registry::ShapeId;

use super::engine::fold_execute;

/// Merges every live shape into one by repeated union.
#[derive(Default)]
pub struct UnionAll;

impl UnionAll {
    /// Creates a new `UnionAll` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the fold; on success the registry holds only the result.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyRegistry` if there is nothing to merge,
    /// or `CsgError::EmptyResult` if the merged shape encloses no area.
    pub fn execute<K: MeshKernel>(&self, domain: &mut Domain<K>) -> Result<ShapeId> {
        fold_execute(domain, BooleanOp::Union)
    }
}

/// Intersects every live shape, left to right in id order.
///
/// Folding stops at the first empty intermediate result; the registry is
/// still replaced by that empty shape.
#[derive(Default)]
pub struct IntersectAll;

impl IntersectAll {
    /// Creates a new `IntersectAll` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the fold; on success the registry holds only the result.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyRegistry` if there is nothing to intersect.
    pub fn execute<K: MeshKernel>(&self, domain: &mut Domain<K>) -> Result<ShapeId> {
        fold_execute(domain, BooleanOp::Intersection)
    }
}
