use crate::domain::Domain;
use crate::error::Result;
use crate::geometry::BooleanOp;
use crate::kernel::MeshKernel;
use crate::registry::ShapeId;

use super::engine::pairwise_execute;

/// Computes the boolean union of two shapes.
pub struct Union {
    shape_a: ShapeId,
    shape_b: ShapeId,
}

impl Union {
    /// Creates a new `Union` operation.
    #[must_use]
    pub fn new(shape_a: ShapeId, shape_b: ShapeId) -> Self {
        Self { shape_a, shape_b }
    }

    /// Executes the union, replacing both inputs with the result.
    ///
    /// # Errors
    ///
    /// Returns `CsgError::EmptyResult` if the union encloses no area, or an
    /// error if either id is unknown or the mesh layer rejects the operation.
    pub fn execute<K: MeshKernel>(&self, domain: &mut Domain<K>) -> Result<ShapeId> {
        pairwise_execute(domain, self.shape_a, self.shape_b, BooleanOp::Union)
    }
}
