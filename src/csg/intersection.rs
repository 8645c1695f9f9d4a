use crate::domain::Domain;
use crate::error::Result;
use crate::geometry::BooleanOp;
use crate::kernel::MeshKernel;
use crate::registry::ShapeId;

use super::engine::pairwise_execute;

/// Computes the geometric intersection of two shapes.
///
/// Disjoint inputs produce a valid, empty shape.
pub struct Intersection {
    shape_a: ShapeId,
    shape_b: ShapeId,
}

impl Intersection {
    /// Creates a new `Intersection` operation.
    #[must_use]
    pub fn new(shape_a: ShapeId, shape_b: ShapeId) -> Self {
        Self { shape_a, shape_b }
    }

    /// Executes the intersection, replacing both inputs with the result.
    ///
    /// # Errors
    ///
    /// Returns an error if either id is unknown or the mesh layer rejects the
    /// operation.
    pub fn execute<K: MeshKernel>(&self, domain: &mut Domain<K>) -> Result<ShapeId> {
        pairwise_execute(domain, self.shape_a, self.shape_b, BooleanOp::Intersection)
    }
}
