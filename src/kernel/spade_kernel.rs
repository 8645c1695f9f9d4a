use std::sync::atomic::{AtomicBool, Ordering};

use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::error::KernelError;
use crate::geometry::{
    fold_boolean, BooleanOp, Boundary, Circle, GeometryParams, Primitive, Rectangle,
};
use crate::math::Point2;

use super::discretize::{discretize, KernelMesh};
use super::refine::{smooth, subdivide};
use super::{ElementBlock, EntityTag, KernelResult, MeshKernel, MeshOptions, NodeBlock};

/// Set while a [`SpadeKernel`] session exists.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone)]
struct KernelEntity {
    boundary: Boundary,
}

/// In-process discretization kernel built on spade's constrained Delaunay
/// triangulation.
///
/// At most one session exists per process, like a gmsh session: acquire it
/// with [`SpadeKernel::acquire`], and dropping it releases the session.
#[derive(Debug)]
pub struct SpadeKernel {
    options: MeshOptions,
    entities: SlotMap<EntityTag, KernelEntity>,
    mesh: Option<KernelMesh>,
}

impl SpadeKernel {
    /// Starts the process-wide kernel session.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::InvalidParameters` for unusable options, or
    /// `KernelError::AlreadyAcquired` if a session is already active.
    pub fn acquire(options: MeshOptions) -> KernelResult<Self> {
        options.validate()?;
        SESSION_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| KernelError::AlreadyAcquired)?;
        info!(element_size = options.element_size, "kernel session started");
        Ok(Self {
            options,
            entities: SlotMap::with_key(),
            mesh: None,
        })
    }

    /// Returns the options this session was started with.
    #[must_use]
    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    /// Returns `true` if a mesh is available for reading.
    #[must_use]
    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    fn insert(&mut self, boundary: Boundary) -> EntityTag {
        self.mesh = None;
        self.entities.insert(KernelEntity { boundary })
    }

    fn add_primitive(
        &mut self,
        primitive: &Primitive,
        operation: &'static str,
    ) -> KernelResult<EntityTag> {
        let boundary = primitive
            .to_boundary(&self.options.geometry)
            .map_err(|e| KernelError::Failed {
                operation,
                reason: e.to_string(),
            })?;
        Ok(self.insert(boundary))
    }

    fn current_mesh(&self, operation: &'static str) -> KernelResult<&KernelMesh> {
        self.mesh.as_ref().ok_or(KernelError::Precondition {
            operation,
            reason: "no mesh has been generated",
        })
    }

    fn ensure_known(&self, tags: &[EntityTag], operation: &'static str) -> KernelResult<()> {
        match tags.iter().find(|tag| !self.entities.contains_key(**tag)) {
            Some(tag) => Err(KernelError::UnknownTag {
                tag: format!("{tag:?}"),
                operation,
            }),
            None => Ok(()),
        }
    }
}

impl Drop for SpadeKernel {
    fn drop(&mut self) {
        SESSION_ACTIVE.store(false, Ordering::Release);
        info!("kernel session finalized");
    }
}

impl MeshKernel for SpadeKernel {
    fn add_rectangle(
        &mut self,
        corner: Point2,
        length: f64,
        height: f64,
    ) -> KernelResult<EntityTag> {
        let rect = Rectangle::new(length, height)
            .at(corner.x + length * 0.5, corner.y + height * 0.5);
        self.add_primitive(&Primitive::Rectangle(rect), "add_rectangle")
    }

    fn add_disk(&mut self, center: Point2, radius: f64) -> KernelResult<EntityTag> {
        let circle = Circle::new(radius).at(center.x, center.y);
        self.add_primitive(&Primitive::Circle(circle), "add_disk")
    }

    fn add_polygon(&mut self, points: &[Point2]) -> KernelResult<EntityTag> {
        self.add_primitive(&Primitive::Polygon(points.to_vec()), "add_polygon")
    }

    fn boolean(&mut self, op: BooleanOp, tags: &[EntityTag]) -> KernelResult<EntityTag> {
        let operation = op.name();
        self.ensure_known(tags, operation)?;
        let mut unique: Vec<EntityTag> = Vec::with_capacity(tags.len());
        for &tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        let result = fold_boolean(
            unique.iter().filter_map(|tag| self.entities.get(*tag)).map(|e| &e.boundary),
            op,
        )
        .ok_or(KernelError::Precondition {
            operation,
            reason: "no entities given",
        })?;
        if result.is_empty() {
            if op != BooleanOp::Intersection {
                return Err(KernelError::Failed {
                    operation,
                    reason: "result is empty".into(),
                });
            }
            warn!(operation, inputs = unique.len(), "boolean produced an empty entity");
        }
        for tag in &unique {
            self.entities.remove(*tag);
        }
        let tag = self.insert(result);
        debug!(operation, inputs = unique.len(), "kernel boolean applied");
        Ok(tag)
    }

    fn remove(&mut self, tags: &[EntityTag]) -> KernelResult<()> {
        self.ensure_known(tags, "remove")?;
        for tag in tags {
            self.entities.remove(*tag);
        }
        self.mesh = None;
        Ok(())
    }

    fn geometry_params(&self) -> GeometryParams {
        self.options.geometry
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn entity_area(&self, tag: EntityTag) -> KernelResult<f64> {
        self.entities
            .get(tag)
            .map(|e| e.boundary.area())
            .ok_or(KernelError::UnknownTag {
                tag: format!("{tag:?}"),
                operation: "entity_area",
            })
    }

    fn generate(&mut self) -> KernelResult<()> {
        let mut mesh = KernelMesh::default();
        for entity in self.entities.values() {
            if entity.boundary.is_empty() {
                continue;
            }
            discretize(&entity.boundary, self.options.element_size, &mut mesh)?;
        }
        info!(
            entities = self.entities.len(),
            nodes = mesh.nodes.len(),
            elements = mesh.element_count(),
            "mesh generated"
        );
        self.mesh = Some(mesh);
        Ok(())
    }

    fn refine(&mut self, passes: usize) -> KernelResult<()> {
        if passes == 0 {
            return Err(KernelError::InvalidParameters(
                "refinement needs at least one pass".into(),
            ));
        }
        let mut mesh = self.current_mesh("refine")?.clone();
        for _ in 0..passes {
            mesh = subdivide(&mesh);
            smooth(&mut mesh, self.options.smoothing_passes)?;
        }
        info!(
            passes,
            nodes = mesh.nodes.len(),
            elements = mesh.element_count(),
            "mesh refined"
        );
        self.mesh = Some(mesh);
        Ok(())
    }

    fn nodes(&self) -> KernelResult<NodeBlock> {
        let mesh = self.current_mesh("nodes")?;
        let mut block = NodeBlock {
            tags: Vec::with_capacity(mesh.nodes.len()),
            coords: Vec::with_capacity(mesh.nodes.len() * 3),
        };
        for (i, p) in mesh.nodes.iter().enumerate() {
            block.tags.push(i + 1);
            block.coords.extend([p.x, p.y, p.z]);
        }
        Ok(block)
    }

    fn elements(&self) -> KernelResult<Vec<ElementBlock>> {
        let mesh = self.current_mesh("elements")?;
        let mut blocks: Vec<ElementBlock> = Vec::new();
        for (element, &kind) in mesh.elements.iter().zip(&mesh.kinds) {
            let index = match blocks.iter().position(|b| b.kind == kind) {
                Some(index) => index,
                None => {
                    blocks.push(ElementBlock {
                        kind,
                        node_tags: Vec::new(),
                    });
                    blocks.len() - 1
                }
            };
            blocks[index].node_tags.extend(element.iter().map(|n| n + 1));
        }
        Ok(blocks)
    }
}
