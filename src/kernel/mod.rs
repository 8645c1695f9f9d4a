//! Discretization kernel boundary.
//!
//! A kernel owns its own collection of tagged 2D entities, applies boolean
//! operators to them, and turns the live set into mesh elements. The read
//! interface mirrors gmsh: one-based node tags with flattened coordinates,
//! and element blocks grouped by element kind.

mod discretize;
mod refine;
mod spade_kernel;

pub use spade_kernel::SpadeKernel;

use crate::error::KernelError;
use crate::geometry::{BooleanOp, GeometryParams};
use crate::halfedge::ElementKind;
use crate::math::Point2;

slotmap::new_key_type! {
    /// Opaque handle to an entity inside a discretization kernel.
    pub struct EntityTag;
}

/// Result type of kernel calls.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Parameters controlling mesh generation and refinement.
#[derive(Debug, Clone, Copy)]
pub struct MeshOptions {
    /// Target element edge length.
    pub element_size: f64,
    /// Laplacian smoothing passes after each refinement subdivision.
    pub smoothing_passes: usize,
    /// Polygonisation of curved primitives.
    pub geometry: GeometryParams,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            element_size: 0.5,
            smoothing_passes: 1,
            geometry: GeometryParams::default(),
        }
    }
}

impl MeshOptions {
    /// Sets the target element edge length.
    #[must_use]
    pub fn with_element_size(mut self, element_size: f64) -> Self {
        self.element_size = element_size;
        self
    }

    /// Sets the number of smoothing passes per refinement.
    #[must_use]
    pub fn with_smoothing_passes(mut self, passes: usize) -> Self {
        self.smoothing_passes = passes;
        self
    }

    /// Sets the curve polygonisation parameters.
    #[must_use]
    pub fn with_geometry(mut self, geometry: GeometryParams) -> Self {
        self.geometry = geometry;
        self
    }

    /// Checks that the options describe a meshable configuration.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::InvalidParameters` for a non-positive or
    /// non-finite element size.
    pub fn validate(&self) -> KernelResult<()> {
        if !self.element_size.is_finite() || self.element_size <= 0.0 {
            return Err(KernelError::InvalidParameters(format!(
                "element size must be positive and finite, got {}",
                self.element_size
            )));
        }
        Ok(())
    }
}

/// Mesh nodes as returned by a kernel.
#[derive(Debug, Clone, Default)]
pub struct NodeBlock {
    /// One-based node tags.
    pub tags: Vec<usize>,
    /// Flattened `x, y, z` coordinates, three per tag.
    pub coords: Vec<f64>,
}

/// All elements of one kind as returned by a kernel.
#[derive(Debug, Clone)]
pub struct ElementBlock {
    /// Element shape.
    pub kind: ElementKind,
    /// Flattened one-based node tags, `kind.sides()` per element.
    pub node_tags: Vec<usize>,
}

/// Operations the mesh layer needs from a discretization kernel.
///
/// Every mutating call is atomic: on error the kernel's entity set and mesh
/// are unchanged.
pub trait MeshKernel {
    /// Adds an axis-aligned rectangle given its lower-left corner.
    ///
    /// # Errors
    ///
    /// Returns an error if the rectangle is degenerate.
    fn add_rectangle(&mut self, corner: Point2, length: f64, height: f64)
        -> KernelResult<EntityTag>;

    /// Adds a disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk is degenerate.
    fn add_disk(&mut self, center: Point2, radius: f64) -> KernelResult<EntityTag>;

    /// Adds a polygon from a closed ring of points.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is degenerate.
    fn add_polygon(&mut self, points: &[Point2]) -> KernelResult<EntityTag>;

    /// Folds `op` over the tagged entities in order, removes them, and
    /// returns the tag of the result.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown tag, or for a union or difference
    /// whose result is empty.
    fn boolean(&mut self, op: BooleanOp, tags: &[EntityTag]) -> KernelResult<EntityTag>;

    /// Returns the polygonisation the kernel applies to curved primitives.
    fn geometry_params(&self) -> GeometryParams;

    /// Removes entities.
    ///
    /// # Errors
    ///
    /// Returns an error if any tag is unknown; nothing is removed then.
    fn remove(&mut self, tags: &[EntityTag]) -> KernelResult<()>;

    /// Number of live entities.
    fn entity_count(&self) -> usize;

    /// Area of an entity's region.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is unknown.
    fn entity_area(&self, tag: EntityTag) -> KernelResult<f64>;

    /// Discretizes every live entity into elements.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity cannot be triangulated.
    fn generate(&mut self) -> KernelResult<()>;

    /// Applies `passes` subdivision and optimisation passes to the current
    /// mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if no mesh has been generated.
    fn refine(&mut self, passes: usize) -> KernelResult<()>;

    /// Nodes of the current mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if no mesh has been generated.
    fn nodes(&self) -> KernelResult<NodeBlock>;

    /// Elements of the current mesh grouped by kind.
    ///
    /// # Errors
    ///
    /// Returns an error if no mesh has been generated.
    fn elements(&self) -> KernelResult<Vec<ElementBlock>>;
}
