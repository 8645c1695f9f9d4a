//! Half-edge connectivity over a fixed set of mesh elements.
//!
//! Built in one pass from flat node/element arrays; rebuilt wholesale
//! whenever the element set changes. Entities reference each other through
//! typed indices into the mesh's arrays.

mod query;

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::math::polygon_2d::polygon_normal;
use crate::math::{Point3, Vector3};

/// Index of a vertex in a [`HalfEdgeMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub usize);

/// Index of a face (one per element) in a [`HalfEdgeMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub usize);

/// Index of a half-edge in a [`HalfEdgeMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HalfEdgeId(pub usize);

/// Shape of a mesh element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// 3-vertex triangle.
    Triangle,
    /// 4-vertex quadrilateral.
    Quadrilateral,
}

impl ElementKind {
    /// Number of sides (and vertices) of the element.
    #[must_use]
    pub fn sides(self) -> usize {
        match self {
            ElementKind::Triangle => 3,
            ElementKind::Quadrilateral => 4,
        }
    }

    /// Element kind with the given number of vertices, if supported.
    #[must_use]
    pub fn from_sides(sides: usize) -> Option<Self> {
        match sides {
            3 => Some(ElementKind::Triangle),
            4 => Some(ElementKind::Quadrilateral),
            _ => None,
        }
    }
}

/// A mesh vertex. Knows one of its outgoing half-edges.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Spatial position.
    pub position: Point3,
    /// One outgoing half-edge; `None` if no element uses the vertex.
    pub half_edge: Option<HalfEdgeId>,
    on_boundary: bool,
}

/// A mesh face, one per element.
#[derive(Debug, Clone)]
pub struct Face {
    /// One half-edge of the face's cycle.
    pub half_edge: HalfEdgeId,
    /// Unit normal from the element's vertex order.
    pub normal: Vector3,
    /// Number of sides.
    pub sides: usize,
}

/// A directed edge bordering exactly one face.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// Vertex the half-edge starts at.
    pub origin: VertexId,
    /// Oppositely directed half-edge of the neighbouring face; `None` on the
    /// mesh boundary.
    pub twin: Option<HalfEdgeId>,
    /// Next half-edge around the same face.
    pub next: HalfEdgeId,
    /// Face this half-edge borders.
    pub face: FaceId,
}

/// Half-edge mesh with index-based arena storage.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    half_edges: Vec<HalfEdge>,
}

/// Pairing state of an undirected vertex pair during construction.
#[derive(Debug, Clone, Copy)]
enum EdgeSlot {
    Open(HalfEdgeId),
    Paired,
}

impl HalfEdgeMesh {
    /// Builds the connectivity of a set of elements.
    ///
    /// `elements[i]` lists the zero-based vertex indices of element `i` in
    /// boundary order and `kinds[i]` its shape. Shared sides are paired into
    /// twins; sides used by a single element become boundary half-edges.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::Malformed` if the arrays disagree in length,
    /// an element has fewer than 3 sides or repeats a vertex, an index is out
    /// of range, a side is traversed twice in the same direction, or a side is
    /// claimed by more than two elements.
    pub fn build<E: AsRef<[usize]>>(
        positions: &[Point3],
        elements: &[E],
        kinds: &[ElementKind],
    ) -> Result<Self> {
        if elements.len() != kinds.len() {
            return Err(malformed(format!(
                "{} elements but {} element kinds",
                elements.len(),
                kinds.len()
            )));
        }

        let mut vertices: Vec<Vertex> = positions
            .iter()
            .map(|&position| Vertex {
                position,
                half_edge: None,
                on_boundary: false,
            })
            .collect();
        let total_sides: usize = elements.iter().map(|e| e.as_ref().len()).sum();
        let mut half_edges: Vec<HalfEdge> = Vec::with_capacity(total_sides);
        let mut faces: Vec<Face> = Vec::with_capacity(elements.len());
        let mut slots: HashMap<(usize, usize), EdgeSlot> = HashMap::with_capacity(total_sides);

        for (fi, (element, &kind)) in elements.iter().zip(kinds).enumerate() {
            let element = element.as_ref();
            validate_element(fi, element, kind, vertices.len())?;
            let n = element.len();
            let base = half_edges.len();
            let face = FaceId(fi);

            for (i, &from) in element.iter().enumerate() {
                let he = HalfEdgeId(base + i);
                half_edges.push(HalfEdge {
                    origin: VertexId(from),
                    twin: None,
                    next: HalfEdgeId(base + (i + 1) % n),
                    face,
                });
                if vertices[from].half_edge.is_none() {
                    vertices[from].half_edge = Some(he);
                }
            }

            for (i, &from) in element.iter().enumerate() {
                let to = element[(i + 1) % n];
                let he = HalfEdgeId(base + i);
                let key = (from.min(to), from.max(to));
                match slots.get(&key).copied() {
                    None => {
                        slots.insert(key, EdgeSlot::Open(he));
                    }
                    Some(EdgeSlot::Open(other)) => {
                        if half_edges[other.0].origin != VertexId(to) {
                            return Err(malformed(format!(
                                "side {from}-{to} of element {fi} has the same direction as \
                                 in element {}",
                                half_edges[other.0].face.0
                            )));
                        }
                        half_edges[he.0].twin = Some(other);
                        half_edges[other.0].twin = Some(he);
                        slots.insert(key, EdgeSlot::Paired);
                    }
                    Some(EdgeSlot::Paired) => {
                        return Err(malformed(format!(
                            "side {from}-{to} is shared by more than two elements \
                             (element {fi})"
                        )));
                    }
                }
            }

            let points: Vec<Point3> = element.iter().map(|&v| vertices[v].position).collect();
            faces.push(Face {
                half_edge: HalfEdgeId(base),
                normal: polygon_normal(&points),
                sides: n,
            });
        }

        let mut boundary_edges = 0usize;
        for he in &half_edges {
            if he.twin.is_none() {
                boundary_edges += 1;
                let dest = half_edges[he.next.0].origin;
                vertices[he.origin.0].on_boundary = true;
                vertices[dest.0].on_boundary = true;
            }
        }

        debug!(
            vertices = vertices.len(),
            faces = faces.len(),
            half_edges = half_edges.len(),
            boundary_edges,
            "built half-edge mesh"
        );

        Ok(Self {
            vertices,
            faces,
            half_edges,
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of half-edges.
    #[must_use]
    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    /// Iterates over all vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId)
    }

    /// Iterates over all face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId)
    }

    /// Iterates over all half-edge ids.
    pub fn half_edge_ids(&self) -> impl Iterator<Item = HalfEdgeId> {
        (0..self.half_edges.len()).map(HalfEdgeId)
    }

    /// Returns a vertex, or an error if the id is out of range.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices.get(id.0).ok_or_else(|| {
            TopologyError::NotFound {
                kind: "vertex",
                index: id.0,
            }
            .into()
        })
    }

    /// Returns a face, or an error if the id is out of range.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn face(&self, id: FaceId) -> Result<&Face> {
        self.faces.get(id.0).ok_or_else(|| {
            TopologyError::NotFound {
                kind: "face",
                index: id.0,
            }
            .into()
        })
    }

    /// Returns a half-edge, or an error if the id is out of range.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn half_edge(&self, id: HalfEdgeId) -> Result<&HalfEdge> {
        self.half_edges.get(id.0).ok_or_else(|| {
            TopologyError::NotFound {
                kind: "half-edge",
                index: id.0,
            }
            .into()
        })
    }
}

fn validate_element(
    index: usize,
    element: &[usize],
    kind: ElementKind,
    vertex_count: usize,
) -> Result<()> {
    let n = element.len();
    if n < 3 {
        return Err(malformed(format!("element {index} has only {n} sides")));
    }
    if n != kind.sides() {
        return Err(malformed(format!(
            "element {index} is a {kind:?} but lists {n} vertices"
        )));
    }
    if let Some(&v) = element.iter().find(|&&v| v >= vertex_count) {
        return Err(malformed(format!(
            "element {index} references vertex {v} of {vertex_count}"
        )));
    }
    for (i, v) in element.iter().enumerate() {
        if element[i + 1..].contains(v) {
            return Err(malformed(format!("element {index} repeats vertex {v}")));
        }
    }
    Ok(())
}

fn malformed(message: String) -> crate::error::FvError {
    TopologyError::Malformed(message).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FvError;

    pub(super) fn unit_square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    fn is_malformed(result: Result<HalfEdgeMesh>) -> bool {
        matches!(result, Err(FvError::Topology(TopologyError::Malformed(_))))
    }

    #[test]
    fn square_split_pairs_diagonal() {
        let mesh = HalfEdgeMesh::build(
            &unit_square(),
            &[[0usize, 1, 2], [0, 2, 3]],
            &[ElementKind::Triangle; 2],
        )
        .unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.half_edge_count(), 6);

        let paired: Vec<HalfEdgeId> = mesh
            .half_edge_ids()
            .filter(|&h| mesh.half_edge(h).unwrap().twin.is_some())
            .collect();
        assert_eq!(paired.len(), 2);
        for h in paired {
            let he = mesh.half_edge(h).unwrap();
            let twin = mesh.half_edge(he.twin.unwrap()).unwrap();
            assert_eq!(twin.twin, Some(h));
            assert_ne!(he.face, twin.face);
        }
        assert_eq!(mesh.boundary_half_edges().len(), 4);
    }

    #[test]
    fn next_cycles_return_to_start() {
        let mesh = HalfEdgeMesh::build(
            &unit_square(),
            &[[0usize, 1, 2, 3]],
            &[ElementKind::Quadrilateral],
        )
        .unwrap();
        let face = mesh.face(FaceId(0)).unwrap();
        let mut h = face.half_edge;
        for _ in 0..face.sides {
            h = mesh.half_edge(h).unwrap().next;
        }
        assert_eq!(h, face.half_edge);
    }

    #[test]
    fn too_few_sides_is_malformed() {
        let result = HalfEdgeMesh::build(
            &unit_square(),
            &[vec![0usize, 1]],
            &[ElementKind::Triangle],
        );
        assert!(is_malformed(result));
    }

    #[test]
    fn kind_mismatch_is_malformed() {
        let result = HalfEdgeMesh::build(
            &unit_square(),
            &[[0usize, 1, 2]],
            &[ElementKind::Quadrilateral],
        );
        assert!(is_malformed(result));
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let result = HalfEdgeMesh::build(&unit_square(), &[[0usize, 1, 9]], &[ElementKind::Triangle]);
        assert!(is_malformed(result));
    }

    #[test]
    fn repeated_vertex_is_malformed() {
        let result = HalfEdgeMesh::build(
            &unit_square(),
            &[[0usize, 1, 0, 2]],
            &[ElementKind::Quadrilateral],
        );
        assert!(is_malformed(result));
    }

    #[test]
    fn non_manifold_edge_is_malformed() {
        let mut positions = unit_square();
        positions.push(Point3::new(0.5, -1.0, 0.0));
        // Three triangles hanging off side 0-2.
        let result = HalfEdgeMesh::build(
            &positions,
            &[[0usize, 2, 1], [2, 0, 3], [0, 2, 4]],
            &[ElementKind::Triangle; 3],
        );
        assert!(is_malformed(result));
    }

    #[test]
    fn inconsistent_orientation_is_malformed() {
        let result = HalfEdgeMesh::build(
            &unit_square(),
            &[[0usize, 1, 2], [0, 3, 2]],
            &[ElementKind::Triangle; 2],
        );
        assert!(is_malformed(result));
    }

    #[test]
    fn length_mismatch_is_malformed() {
        let result = HalfEdgeMesh::build(&unit_square(), &[[0usize, 1, 2]], &[]);
        assert!(is_malformed(result));
    }

    #[test]
    fn unused_vertex_has_no_half_edge() {
        let mut positions = unit_square();
        positions.push(Point3::new(5.0, 5.0, 0.0));
        let mesh =
            HalfEdgeMesh::build(&positions, &[[0usize, 1, 2]], &[ElementKind::Triangle]).unwrap();
        assert!(mesh.vertex(VertexId(4)).unwrap().half_edge.is_none());
        assert!(mesh.vertex(VertexId(5)).is_err());
    }
}
