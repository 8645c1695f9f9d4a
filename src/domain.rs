use tracing::debug;

use crate::csg::{Difference, IntersectAll, Intersection, Union, UnionAll};
use crate::error::Result;
use crate::geometry::{Aabb, Boundary, Circle, GeometryParams, Primitive, Rectangle};
use crate::halfedge::HalfEdgeMesh;
use crate::kernel::{MeshKernel, MeshOptions, SpadeKernel};
use crate::math::Point2;
use crate::registry::{Provenance, ShapeId, ShapeRecord, ShapeRegistry};
use crate::sync::{MeshSync, RawMesh};

/// A 2D simulation domain: the shape registry plus its mesh mirror.
///
/// Every mutation goes through both sides or through neither, so the live
/// ids of [`Domain::registry`] and [`Domain::mesh_sync`] are always equal.
#[derive(Debug)]
pub struct Domain<K: MeshKernel = SpadeKernel> {
    pub(crate) registry: ShapeRegistry,
    pub(crate) mesh: MeshSync<K>,
}

impl Domain<SpadeKernel> {
    /// Creates an empty domain on the process-wide [`SpadeKernel`] with
    /// default mesh options.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::AlreadyAcquired` if another domain holds the
    /// kernel.
    pub fn new() -> Result<Self> {
        Self::with_options(MeshOptions::default())
    }

    /// Creates an empty domain on the process-wide [`SpadeKernel`].
    ///
    /// # Errors
    ///
    /// Returns `KernelError::AlreadyAcquired` if another domain holds the
    /// kernel, or `KernelError::InvalidParameters` for unusable options.
    pub fn with_options(options: MeshOptions) -> Result<Self> {
        Ok(Self::with_kernel(SpadeKernel::acquire(options)?))
    }
}

impl<K: MeshKernel> Domain<K> {
    /// Creates an empty domain over an already acquired kernel.
    ///
    /// Registry boundaries are polygonised with the kernel's own
    /// [`GeometryParams`], so both layers agree on curved shapes.
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            registry: ShapeRegistry::new(),
            mesh: MeshSync::new(kernel),
        }
    }

    /// Returns the polygonisation parameters shared with the kernel.
    #[must_use]
    pub fn geometry_params(&self) -> GeometryParams {
        self.mesh.kernel().geometry_params()
    }

    // --- primitives ---

    /// Adds a rectangle.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` for non-positive extents, or a kernel error.
    pub fn add_rectangle(&mut self, rect: Rectangle) -> Result<ShapeId> {
        self.add(&Primitive::Rectangle(rect))
    }

    /// Adds a square of side `side` centered at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` for a non-positive side, or a kernel error.
    pub fn add_square(&mut self, side: f64, x: f64, y: f64) -> Result<ShapeId> {
        self.add(&Primitive::Square(Rectangle::square(side).at(x, y)))
    }

    /// Adds a circle.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` for a non-positive radius, or a kernel error.
    pub fn add_circle(&mut self, circle: Circle) -> Result<ShapeId> {
        self.add(&Primitive::Circle(circle))
    }

    /// Adds a polygon from a closed ring of points.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` for a degenerate ring, or a kernel error.
    pub fn add_polygon(&mut self, points: &[Point2]) -> Result<ShapeId> {
        self.add(&Primitive::Polygon(points.to_vec()))
    }

    /// Adds any primitive: validated first, then mirrored into the kernel,
    /// then recorded.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` for invalid input, or a kernel error.
    pub fn add(&mut self, primitive: &Primitive) -> Result<ShapeId> {
        let boundary = primitive.to_boundary(&self.geometry_params())?;
        let id = self.registry.peek_next_id();
        self.mesh.add_primitive(id, primitive)?;
        let added = self
            .registry
            .add(boundary, format!("{} {}", primitive.kind(), id.0));
        debug!(id = %added, kind = primitive.kind(), "primitive added");
        Ok(added)
    }

    /// Replaces the shape of a live id with a new primitive, keeping the id.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if `id` is not live, `GeometryError`
    /// for invalid input, or a kernel error. Nothing changes on error.
    pub fn replace(&mut self, id: ShapeId, primitive: &Primitive) -> Result<Boundary> {
        self.registry.ensure_live(&[id], "replace")?;
        let boundary = primitive.to_boundary(&self.geometry_params())?;
        self.mesh.replace(id, primitive)?;
        self.registry.replace(id, boundary, Provenance::Primitive)
    }

    /// Removes shapes from both the registry and the mesh layer.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if any id is not live; nothing is
    /// removed then.
    pub fn remove(&mut self, ids: &[ShapeId]) -> Result<Vec<ShapeRecord>> {
        self.registry.ensure_live(ids, "remove")?;
        self.mesh.remove(ids)?;
        self.registry.remove(ids)
    }

    // --- queries ---

    /// Boundary of a live shape.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if `id` is not live.
    pub fn get(&self, id: ShapeId) -> Result<&Boundary> {
        self.registry.get(id)
    }

    /// Full record of a live shape.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if `id` is not live.
    pub fn record(&self, id: ShapeId) -> Result<&ShapeRecord> {
        self.registry.record(id)
    }

    /// Live records in id order.
    #[must_use]
    pub fn list(&self) -> Vec<&ShapeRecord> {
        self.registry.list()
    }

    /// Bounding box of every live shape.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.registry.bounds()
    }

    /// The shape registry.
    #[must_use]
    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// The mesh layer.
    #[must_use]
    pub fn mesh_sync(&self) -> &MeshSync<K> {
        &self.mesh
    }

    // --- CSG ---

    /// See [`Union`].
    ///
    /// # Errors
    ///
    /// Returns `CsgError::EmptyResult` if both shapes are empty, or an error
    /// if either id is unknown or the kernel fails.
    pub fn union(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId> {
        Union::new(a, b).execute(self)
    }

    /// See [`Intersection`].
    ///
    /// # Errors
    ///
    /// Returns an error if either id is unknown or the kernel fails.
    pub fn intersection(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId> {
        Intersection::new(a, b).execute(self)
    }

    /// See [`Difference`].
    ///
    /// # Errors
    ///
    /// Returns `CsgError::EmptyResult` if nothing of `a` remains, or an error
    /// if either id is unknown or the kernel fails.
    pub fn difference(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId> {
        Difference::new(a, b).execute(self)
    }

    /// See [`UnionAll`].
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyRegistry` for an empty domain, or
    /// `CsgError::EmptyResult` if every shape is empty.
    pub fn union_all(&mut self) -> Result<ShapeId> {
        UnionAll::new().execute(self)
    }

    /// See [`IntersectAll`].
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::EmptyRegistry` for an empty domain.
    pub fn intersect_all(&mut self) -> Result<ShapeId> {
        IntersectAll::new().execute(self)
    }

    // --- meshing ---

    /// Discretizes the current shapes.
    ///
    /// # Errors
    ///
    /// Propagates kernel failures.
    pub fn generate(&mut self) -> Result<()> {
        self.mesh.generate()
    }

    /// Refines the current mesh `iterations` times.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::Precondition` before [`Domain::generate`].
    pub fn refine(&mut self, iterations: usize) -> Result<()> {
        self.mesh.refine(iterations)
    }

    /// Current mesh as zero-based arrays.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::Precondition` before [`Domain::generate`].
    pub fn export_elements(&self) -> Result<RawMesh> {
        self.mesh.export_elements()
    }

    /// Builds half-edge connectivity over the current mesh.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::Precondition` before [`Domain::generate`], or
    /// `TopologyError::Malformed` for non-manifold output.
    pub fn half_edge_mesh(&self) -> Result<HalfEdgeMesh> {
        self.export_elements()?.to_half_edge_mesh()
    }
}
