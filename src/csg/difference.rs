use crate::domain::Domain;
use crate::error::Result;
use crate::geometry::BooleanOp;
use crate::kernel::MeshKernel;
use crate::registry::ShapeId;

use super::engine::pairwise_execute;

/// Subtracts one shape from another (`a - b`).
pub struct Difference {
    shape_a: ShapeId,
    shape_b: ShapeId,
}

impl Difference {
    /// Creates a new `Difference` operation.
    #[must_use]
    pub fn new(shape_a: ShapeId, shape_b: ShapeId) -> Self {
        Self { shape_a, shape_b }
    }

    /// Executes the difference, replacing both inputs with the result.
    ///
    /// # Errors
    ///
    /// Returns `CsgError::EmptyResult` if nothing of `a` remains, or an error
    /// if either id is unknown or the mesh layer rejects the operation.
    pub fn execute<K: MeshKernel>(&self, domain: &mut Domain<K>) -> Result<ShapeId> {
        pairwise_execute(domain, self.shape_a, self.shape_b, BooleanOp::Difference)
    }
}
