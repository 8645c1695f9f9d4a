//! Mirror of the shape registry inside a discretization kernel.
//!
//! [`MeshSync`] keeps one kernel entity per live shape, keyed by the same
//! [`ShapeId`]. Every mutation is forwarded to the kernel first and only
//! recorded here once the kernel call has succeeded.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::error::{KernelError, Result};
use crate::geometry::{BooleanOp, Primitive};
use crate::halfedge::{ElementKind, HalfEdgeMesh};
use crate::kernel::{EntityTag, MeshKernel};
use crate::math::Point3;
use crate::registry::{Provenance, ShapeId};

/// A kernel entity mirrored from a shape record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshEntity {
    /// Id shared with the matching shape record.
    pub id: ShapeId,
    /// Topological dimension of the entity (2 for surfaces).
    pub dimension: u32,
    /// Handle of the entity inside the kernel.
    pub tag: EntityTag,
    /// Display name, `"<Kind> <id>"`.
    pub name: String,
}

/// Zero-based node and element arrays read back from a kernel.
#[derive(Debug, Clone, Default)]
pub struct RawMesh {
    /// Node positions.
    pub positions: Vec<Point3>,
    /// Zero-based node indices per element.
    pub elements: Vec<Vec<usize>>,
    /// Shape of each element.
    pub kinds: Vec<ElementKind>,
}

impl RawMesh {
    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Builds half-edge connectivity over the elements.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::Malformed` for non-manifold or degenerate
    /// elements.
    pub fn to_half_edge_mesh(&self) -> Result<HalfEdgeMesh> {
        HalfEdgeMesh::build(&self.positions, &self.elements, &self.kinds)
    }
}

/// Parallel mesh-entity collection over a [`MeshKernel`].
#[derive(Debug)]
pub struct MeshSync<K: MeshKernel> {
    kernel: K,
    entities: BTreeMap<ShapeId, MeshEntity>,
    mesh_ready: bool,
}

impl<K: MeshKernel> MeshSync<K> {
    /// Wraps a kernel that holds no entities yet.
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            entities: BTreeMap::new(),
            mesh_ready: false,
        }
    }

    /// Adds the kernel equivalent of a primitive under `id`.
    ///
    /// Rectangles and squares are passed to the kernel by their lower-left
    /// corner.
    ///
    /// # Errors
    ///
    /// Fails if `id` is already mirrored or if the kernel rejects the shape.
    pub fn add_primitive(&mut self, id: ShapeId, primitive: &Primitive) -> Result<ShapeId> {
        if self.entities.contains_key(&id) {
            return Err(KernelError::Failed {
                operation: "add",
                reason: format!("shape {id} already has a mesh entity"),
            }
            .into());
        }
        let tag = self.kernel_add(primitive)?;
        self.insert(id, tag, primitive.kind());
        Ok(id)
    }

    /// Unites the entities of `a` and `b` into a new entity under `result`.
    ///
    /// # Errors
    ///
    /// Fails if either id has no entity or the kernel call fails.
    pub fn union(&mut self, a: ShapeId, b: ShapeId, result: ShapeId) -> Result<ShapeId> {
        self.pairwise(BooleanOp::Union, a, b, result)
    }

    /// Intersects the entities of `a` and `b` into a new entity under `result`.
    ///
    /// # Errors
    ///
    /// Fails if either id has no entity or the kernel call fails.
    pub fn intersection(&mut self, a: ShapeId, b: ShapeId, result: ShapeId) -> Result<ShapeId> {
        self.pairwise(BooleanOp::Intersection, a, b, result)
    }

    /// Subtracts the entity of `b` from that of `a` under `result`.
    ///
    /// # Errors
    ///
    /// Fails if either id has no entity or the kernel call fails.
    pub fn difference(&mut self, a: ShapeId, b: ShapeId, result: ShapeId) -> Result<ShapeId> {
        self.pairwise(BooleanOp::Difference, a, b, result)
    }

    /// Unites every entity, in id order, into one entity under `result`.
    ///
    /// # Errors
    ///
    /// Fails if there are no entities or the kernel call fails.
    pub fn union_all(&mut self, result: ShapeId) -> Result<ShapeId> {
        self.fold_all(BooleanOp::Union, result)
    }

    /// Intersects every entity, in id order, into one entity under `result`.
    ///
    /// # Errors
    ///
    /// Fails if there are no entities or the kernel call fails.
    pub fn intersect_all(&mut self, result: ShapeId) -> Result<ShapeId> {
        self.fold_all(BooleanOp::Intersection, result)
    }

    /// Swaps the entity of `id` for the kernel equivalent of `primitive`.
    ///
    /// # Errors
    ///
    /// Fails if `id` has no entity or the kernel rejects the new shape; the
    /// old entity is kept then.
    pub fn replace(&mut self, id: ShapeId, primitive: &Primitive) -> Result<()> {
        let old = self.tag_of(id, "replace")?;
        let tag = self.kernel_add(primitive)?;
        if let Err(e) = self.kernel.remove(&[old]) {
            // The old entity stays the one mapped to `id`.
            if let Err(rollback) = self.kernel.remove(&[tag]) {
                warn!(%id, ?tag, error = %rollback, "replacement entity left in kernel");
            }
            return Err(e.into());
        }
        self.insert(id, tag, primitive.kind());
        Ok(())
    }

    /// Removes the entities of `ids`. Either all are removed or none.
    ///
    /// # Errors
    ///
    /// Fails if any id has no entity or the kernel call fails.
    pub fn remove(&mut self, ids: &[ShapeId]) -> Result<()> {
        let mut tags = Vec::with_capacity(ids.len());
        for &id in ids {
            let tag = self.tag_of(id, "remove")?;
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        self.kernel.remove(&tags)?;
        for id in ids {
            self.entities.remove(id);
        }
        self.mesh_ready = false;
        debug!(count = tags.len(), "removed mesh entities");
        Ok(())
    }

    /// Discretizes the live entities. Sets the mesh-ready flag on success.
    ///
    /// # Errors
    ///
    /// Propagates kernel failures; the flag is left cleared then.
    pub fn generate(&mut self) -> Result<()> {
        self.mesh_ready = false;
        self.kernel.generate()?;
        self.mesh_ready = true;
        Ok(())
    }

    /// Runs `iterations` refinement passes on the current mesh.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::Precondition` if no mesh has been generated
    /// since the last geometry edit, or propagates kernel failures.
    pub fn refine(&mut self, iterations: usize) -> Result<()> {
        self.ensure_ready("refine")?;
        self.kernel.refine(iterations)?;
        Ok(())
    }

    /// Reads the current mesh as zero-based arrays.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::Precondition` if no mesh has been generated
    /// since the last geometry edit, or `KernelError::Failed` if the kernel
    /// output is inconsistent.
    pub fn export_elements(&self) -> Result<RawMesh> {
        self.ensure_ready("export_elements")?;
        let nodes = self.kernel.nodes()?;
        if nodes.coords.len() != nodes.tags.len() * 3 {
            return Err(export_failed(format!(
                "{} node tags but {} coordinates",
                nodes.tags.len(),
                nodes.coords.len()
            )));
        }

        let mut index_of: HashMap<usize, usize> = HashMap::with_capacity(nodes.tags.len());
        let mut positions = Vec::with_capacity(nodes.tags.len());
        for (i, (tag, xyz)) in nodes.tags.iter().zip(nodes.coords.chunks_exact(3)).enumerate() {
            index_of.insert(*tag, i);
            positions.push(Point3::new(xyz[0], xyz[1], xyz[2]));
        }

        let mut elements = Vec::new();
        let mut kinds = Vec::new();
        for block in self.kernel.elements()? {
            let sides = block.kind.sides();
            if block.node_tags.len() % sides != 0 {
                return Err(export_failed(format!(
                    "{} node tags do not split into {sides}-node elements",
                    block.node_tags.len()
                )));
            }
            for chunk in block.node_tags.chunks_exact(sides) {
                let element = chunk
                    .iter()
                    .map(|tag| {
                        index_of
                            .get(tag)
                            .copied()
                            .ok_or_else(|| export_failed(format!("unknown node tag {tag}")))
                    })
                    .collect::<Result<Vec<usize>>>()?;
                elements.push(element);
                kinds.push(block.kind);
            }
        }

        Ok(RawMesh {
            positions,
            elements,
            kinds,
        })
    }

    /// Entity mirrored for `id`.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::UnknownEntity` if `id` has no entity.
    pub fn entity(&self, id: ShapeId) -> Result<&MeshEntity> {
        self.entities.get(&id).ok_or_else(|| {
            KernelError::UnknownEntity {
                id,
                operation: "entity",
            }
            .into()
        })
    }

    /// Ids of all entities in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ShapeId> {
        self.entities.keys().copied().collect()
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns `true` if the kernel holds a mesh of the current entities.
    #[must_use]
    pub fn is_mesh_ready(&self) -> bool {
        self.mesh_ready
    }

    /// The wrapped kernel.
    #[must_use]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    fn kernel_add(&mut self, primitive: &Primitive) -> Result<EntityTag> {
        let tag = match primitive {
            Primitive::Rectangle(rect) | Primitive::Square(rect) => {
                self.kernel
                    .add_rectangle(rect.corner(), rect.length, rect.height)?
            }
            Primitive::Circle(circle) => self.kernel.add_disk(circle.center, circle.radius)?,
            Primitive::Polygon(points) => self.kernel.add_polygon(points)?,
        };
        self.mesh_ready = false;
        Ok(tag)
    }

    fn pairwise(
        &mut self,
        op: BooleanOp,
        a: ShapeId,
        b: ShapeId,
        result: ShapeId,
    ) -> Result<ShapeId> {
        let operation = op.name();
        let tags = [self.tag_of(a, operation)?, self.tag_of(b, operation)?];
        let tag = self.kernel.boolean(op, &tags)?;
        self.entities.remove(&a);
        self.entities.remove(&b);
        self.insert(result, tag, Provenance::from(op).label());
        debug!(operation, %a, %b, %result, "mesh entities combined");
        Ok(result)
    }

    fn fold_all(&mut self, op: BooleanOp, result: ShapeId) -> Result<ShapeId> {
        let operation = match op {
            BooleanOp::Intersection => "intersect_all",
            _ => "union_all",
        };
        if self.entities.is_empty() {
            return Err(KernelError::Precondition {
                operation,
                reason: "no mesh entities",
            }
            .into());
        }
        let tags: Vec<EntityTag> = self.entities.values().map(|e| e.tag).collect();
        let tag = self.kernel.boolean(op, &tags)?;
        self.entities.clear();
        self.insert(result, tag, Provenance::from(op).label());
        debug!(operation, inputs = tags.len(), %result, "mesh entities folded");
        Ok(result)
    }

    fn insert(&mut self, id: ShapeId, tag: EntityTag, kind: &str) {
        self.mesh_ready = false;
        self.entities.insert(
            id,
            MeshEntity {
                id,
                dimension: 2,
                tag,
                name: format!("{kind} {}", id.0),
            },
        );
    }

    fn tag_of(&self, id: ShapeId, operation: &'static str) -> Result<EntityTag> {
        self.entities
            .get(&id)
            .map(|e| e.tag)
            .ok_or_else(|| KernelError::UnknownEntity { id, operation }.into())
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<()> {
        if self.mesh_ready {
            Ok(())
        } else {
            Err(KernelError::Precondition {
                operation,
                reason: "generate has not been called since the last geometry change",
            }
            .into())
        }
    }
}

fn export_failed(reason: String) -> crate::FvError {
    KernelError::Failed {
        operation: "export_elements",
        reason,
    }
    .into()
}
