use std::collections::HashMap;

use crate::error::Result;
use crate::math::polygon_2d::{newell_vector, polygon_centroid, vertex_average};
use crate::math::{Point3, Vector3};

use super::{FaceId, HalfEdgeId, HalfEdgeMesh, VertexId};

impl HalfEdgeMesh {
    /// Vertex a half-edge points to.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn destination(&self, he: HalfEdgeId) -> Result<VertexId> {
        let next = self.half_edge(he)?.next;
        Ok(self.half_edges[next.0].origin)
    }

    /// Half-edge preceding `he` in its face cycle.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn prev(&self, he: HalfEdgeId) -> Result<HalfEdgeId> {
        let mut h = self.half_edge(he)?.next;
        loop {
            let next = self.half_edges[h.0].next;
            if next == he {
                return Ok(h);
            }
            h = next;
        }
    }

    /// Vertices of a face in cycle order.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn face_vertices(&self, face: FaceId) -> Result<Vec<VertexId>> {
        let face = self.face(face)?;
        let mut out = Vec::with_capacity(face.sides);
        let mut h = face.half_edge;
        for _ in 0..face.sides {
            let he = &self.half_edges[h.0];
            out.push(he.origin);
            h = he.next;
        }
        Ok(out)
    }

    fn face_points(&self, face: FaceId) -> Result<Vec<Point3>> {
        Ok(self
            .face_vertices(face)?
            .into_iter()
            .map(|v| self.vertices[v.0].position)
            .collect())
    }

    /// Vertices one edge away from `vertex`, in rotational order.
    ///
    /// Walks `he = he.twin.next` from the stored outgoing half-edge. On an
    /// open fan the walk stops at a boundary side and resumes from the start
    /// in the opposite direction.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn one_ring(&self, vertex: VertexId) -> Result<Vec<VertexId>> {
        let Some(start) = self.vertex(vertex)?.half_edge else {
            return Ok(Vec::new());
        };
        let limit = self.half_edges.len();
        let mut ring = Vec::new();

        let mut h = start;
        loop {
            ring.push(self.destination(h)?);
            match self.half_edges[h.0].twin {
                Some(twin) => {
                    h = self.half_edges[twin.0].next;
                    if h == start {
                        return Ok(ring);
                    }
                }
                None => break,
            }
            if ring.len() > limit {
                break;
            }
        }

        let mut h = start;
        loop {
            let incoming = self.prev(h)?;
            match self.half_edges[incoming.0].twin {
                Some(twin) => {
                    ring.push(self.destination(twin)?);
                    h = twin;
                }
                None => {
                    ring.push(self.half_edges[incoming.0].origin);
                    break;
                }
            }
            if ring.len() > limit {
                break;
            }
        }
        Ok(ring)
    }

    /// Returns `true` if any side incident to the vertex has no twin.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn is_boundary(&self, vertex: VertexId) -> Result<bool> {
        Ok(self.vertex(vertex)?.on_boundary)
    }

    /// Number of distinct edges incident to the vertex.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn degree(&self, vertex: VertexId) -> Result<usize> {
        Ok(self.one_ring(vertex)?.len())
    }

    /// Mean position of the one-ring neighbours, or `None` for a vertex no
    /// element uses.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn neighbor_centroid(&self, vertex: VertexId) -> Result<Option<Point3>> {
        let ring = self.one_ring(vertex)?;
        if ring.is_empty() {
            return Ok(None);
        }
        let points: Vec<Point3> = ring.iter().map(|v| self.vertices[v.0].position).collect();
        Ok(Some(vertex_average(&points)))
    }

    /// Unit normal of a face.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn face_normal(&self, face: FaceId) -> Result<Vector3> {
        Ok(self.face(face)?.normal)
    }

    /// Area of the element, i.e. its volume per unit depth.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn cell_volume(&self, face: FaceId) -> Result<f64> {
        Ok(newell_vector(&self.face_points(face)?).norm() * 0.5)
    }

    /// Length of the element's boundary.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn cell_perimeter(&self, face: FaceId) -> Result<f64> {
        let points = self.face_points(face)?;
        let next = points.iter().cycle().skip(1);
        Ok(points.iter().zip(next).map(|(a, b)| (b - a).norm()).sum())
    }

    /// Area-weighted centroid of the element.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn cell_centroid(&self, face: FaceId) -> Result<Point3> {
        Ok(polygon_centroid(&self.face_points(face)?))
    }

    /// Outward normal of a side within its face's plane, scaled by the side
    /// length.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NotFound` for an unknown id.
    pub fn edge_normal(&self, he: HalfEdgeId) -> Result<Vector3> {
        let half_edge = self.half_edge(he)?;
        let a = self.vertices[half_edge.origin.0].position;
        let b = self.vertices[self.destination(he)?.0].position;
        let normal = self.faces[half_edge.face.0].normal;
        Ok((b - a).cross(&normal))
    }

    /// Total area of all elements.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.face_ids()
            .filter_map(|f| self.cell_volume(f).ok())
            .sum()
    }

    /// All half-edges without a twin.
    #[must_use]
    pub fn boundary_half_edges(&self) -> Vec<HalfEdgeId> {
        self.half_edge_ids()
            .filter(|h| self.half_edges[h.0].twin.is_none())
            .collect()
    }

    /// Closed boundary vertex cycles, each following the face orientation.
    ///
    /// A vertex where two boundary cycles touch is visited by both.
    #[must_use]
    pub fn boundary_loops(&self) -> Vec<Vec<VertexId>> {
        let boundary = self.boundary_half_edges();
        let mut by_origin: HashMap<VertexId, Vec<HalfEdgeId>> = HashMap::new();
        for &h in &boundary {
            by_origin
                .entry(self.half_edges[h.0].origin)
                .or_default()
                .push(h);
        }

        let mut visited = vec![false; self.half_edges.len()];
        let mut loops = Vec::new();
        for &start in &boundary {
            if visited[start.0] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut h = start;
            loop {
                visited[h.0] = true;
                let he = &self.half_edges[h.0];
                cycle.push(he.origin);
                let dest = self.half_edges[he.next.0].origin;
                let next = by_origin
                    .get(&dest)
                    .and_then(|cands| cands.iter().copied().find(|c| !visited[c.0]));
                match next {
                    Some(n) => h = n,
                    None => break,
                }
            }
            loops.push(cycle);
        }
        loops
    }
}
