use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};

use geo::{BoundingRect, Contains, Distance, Euclidean, Point, Polygon};
use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::KernelError;
use crate::geometry::Boundary;
use crate::halfedge::ElementKind;
use crate::math::{Point2, Point3};

use super::KernelResult;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Mesh held by a kernel between `generate` and the next geometry edit.
#[derive(Debug, Clone, Default)]
pub(super) struct KernelMesh {
    pub nodes: Vec<Point3>,
    pub elements: Vec<Vec<usize>>,
    pub kinds: Vec<ElementKind>,
}

impl KernelMesh {
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}

/// Triangulates every polygon of `boundary` and appends the elements to
/// `mesh`. Each polygon gets its own nodes.
///
/// Boundary rings are split into pieces no longer than `element_size`;
/// interior points are seeded on a lattice of the same spacing, then a
/// constrained Delaunay triangulation is restricted to the region.
pub(super) fn discretize(
    boundary: &Boundary,
    element_size: f64,
    mesh: &mut KernelMesh,
) -> KernelResult<()> {
    let polygons = &boundary.as_multi_polygon().0;
    for (rings, polygon) in boundary.rings().into_iter().zip(polygons) {
        let mut cdt = Cdt::new();
        let holes = rings.holes.iter();
        for ring in std::iter::once(&rings.exterior).chain(holes) {
            let dense = densify(ring, element_size);
            if dense.len() < 3 {
                return Err(failed("boundary loop needs at least 3 points".into()));
            }
            cdt.add_constraint_edges(dense.iter().map(|p| SpadePoint2::new(p.x, p.y)), true)
                .map_err(insertion_failed)?;
        }
        for seed in lattice_seeds(polygon, element_size) {
            cdt.insert(SpadePoint2::new(seed.x, seed.y))
                .map_err(insertion_failed)?;
        }

        let interior = interior_faces(&cdt);
        let mut vertex_map: HashMap<usize, usize> = HashMap::new();
        for face in cdt.inner_faces() {
            if !interior.contains(&face.fix().index()) {
                continue;
            }
            let mut element = Vec::with_capacity(3);
            for vh in face.vertices() {
                let node = *vertex_map.entry(vh.fix().index()).or_insert_with(|| {
                    let p = vh.position();
                    mesh.nodes.push(Point3::new(p.x, p.y, 0.0));
                    mesh.nodes.len() - 1
                });
                element.push(node);
            }
            mesh.elements.push(element);
            mesh.kinds.push(ElementKind::Triangle);
        }
    }
    Ok(())
}

/// Splits every side of a closed ring into equal pieces of at most `size`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn densify(ring: &[Point2], size: f64) -> Vec<Point2> {
    let n = ring.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let pieces = ((b - a).norm() / size).ceil().max(1.0) as usize;
        for k in 0..pieces {
            let t = k as f64 / pieces as f64;
            out.push(a + (b - a) * t);
        }
    }
    out
}

/// Lattice points strictly inside `polygon` and at least half a spacing
/// away from each of its rings.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lattice_seeds(polygon: &Polygon<f64>, size: f64) -> Vec<Point2> {
    let Some(rect) = polygon.bounding_rect() else {
        return Vec::new();
    };
    let nx = (rect.width() / size).floor() as usize;
    let ny = (rect.height() / size).floor() as usize;
    let clearance = size * 0.5;
    let mut seeds = Vec::new();
    for j in 1..=ny {
        for i in 1..=nx {
            #[allow(clippy::cast_precision_loss)]
            let p = Point::new(rect.min().x + i as f64 * size, rect.min().y + j as f64 * size);
            if polygon.contains(&p) && ring_clearance(polygon, &p) >= clearance {
                seeds.push(Point2::new(p.x(), p.y()));
            }
        }
    }
    seeds
}

/// Distance from `p` to the nearest ring of `polygon`.
fn ring_clearance(polygon: &Polygon<f64>, p: &Point<f64>) -> f64 {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| Euclidean.distance(p, ring))
        .fold(f64::INFINITY, f64::min)
}

/// Marks the triangles enclosed by the constraint loops.
///
/// A breadth-first walk starts at the triangles on the convex hull, which
/// are outside unless their hull side is itself a loop side. Stepping over
/// a constraint edge flips inside and outside.
fn interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut inside: HashMap<usize, bool> = HashMap::new();
    let mut pending: VecDeque<(FixedFaceHandle<InnerTag>, bool)> = VecDeque::new();

    let outer = cdt.outer_face().fix();
    for hull_edge in cdt.directed_edges().filter(|e| e.face().fix() == outer) {
        let Some(face) = hull_edge.rev().face().as_inner() else {
            continue;
        };
        let state = cdt.is_constraint_edge(hull_edge.as_undirected().fix());
        if let Entry::Vacant(slot) = inside.entry(face.fix().index()) {
            slot.insert(state);
            pending.push_back((face.fix(), state));
        }
    }

    while let Some((fix, state)) = pending.pop_front() {
        for edge in cdt.face(fix).adjacent_edges() {
            let Some(next) = edge.rev().face().as_inner() else {
                continue;
            };
            let flipped = state != cdt.is_constraint_edge(edge.as_undirected().fix());
            if let Entry::Vacant(slot) = inside.entry(next.fix().index()) {
                slot.insert(flipped);
                pending.push_back((next.fix(), flipped));
            }
        }
    }

    inside
        .into_iter()
        .filter_map(|(index, state)| state.then_some(index))
        .collect()
}

#[allow(clippy::needless_pass_by_value)]
fn insertion_failed(e: InsertionError) -> KernelError {
    failed(format!("CDT insert: {e}"))
}

fn failed(reason: String) -> KernelError {
    KernelError::Failed {
        operation: "generate",
        reason,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{apply_boolean, BooleanOp};
    use crate::math::polygon_2d::signed_area_2d;

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Boundary {
        Boundary::from_ring(&[
            Point2::new(x0, y0),
            Point2::new(x0 + w, y0),
            Point2::new(x0 + w, y0 + h),
            Point2::new(x0, y0 + h),
        ])
        .unwrap()
    }

    fn mesh_area(mesh: &KernelMesh) -> f64 {
        mesh.elements
            .iter()
            .map(|e| {
                let pts: Vec<Point3> = e.iter().map(|&i| mesh.nodes[i]).collect();
                signed_area_2d(&pts)
            })
            .sum()
    }

    #[test]
    fn coarse_square_is_two_triangles() {
        let mut mesh = KernelMesh::default();
        discretize(&rect(0.0, 0.0, 1.0, 1.0), 10.0, &mut mesh).unwrap();
        assert_eq!(mesh.element_count(), 2);
        assert_eq!(mesh.nodes.len(), 4);
    }

    #[test]
    fn fine_rectangle_covers_area_counter_clockwise() {
        let mut mesh = KernelMesh::default();
        discretize(&rect(0.0, 0.0, 4.0, 2.0), 0.5, &mut mesh).unwrap();
        assert!(mesh.element_count() > 16);
        assert!((mesh_area(&mesh) - 8.0).abs() < 1e-9);
        for e in &mesh.elements {
            let pts: Vec<Point3> = e.iter().map(|&i| mesh.nodes[i]).collect();
            assert!(signed_area_2d(&pts) > 0.0);
        }
    }

    #[test]
    fn hole_is_not_meshed() {
        let outer = rect(0.0, 0.0, 4.0, 4.0);
        let inner = rect(1.0, 1.0, 2.0, 2.0);
        let region = apply_boolean(&outer, &inner, BooleanOp::Difference);
        let mut mesh = KernelMesh::default();
        discretize(&region, 0.5, &mut mesh).unwrap();
        assert!((mesh_area(&mesh) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn densify_respects_size() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ];
        let dense = densify(&ring, 0.25);
        assert_eq!(dense.len(), 4 + 4 + 6);
    }

    #[test]
    fn seeds_keep_clear_of_rings() {
        let outer = rect(0.0, 0.0, 4.0, 4.0);
        let inner = rect(1.5, 1.5, 1.0, 1.0);
        let region = apply_boolean(&outer, &inner, BooleanOp::Difference);
        let polygon = &region.as_multi_polygon().0[0];
        let seeds = lattice_seeds(polygon, 0.5);
        assert!(!seeds.is_empty());
        for s in &seeds {
            let p = Point::new(s.x, s.y);
            assert!(ring_clearance(polygon, &p) >= 0.25);
            assert!(!inner.contains_point(s));
        }
        // (2, 2) is the centre of the hole.
        assert!(seeds
            .iter()
            .all(|s| (s - Point2::new(2.0, 2.0)).norm() > 0.5));
    }

    #[test]
    fn polygons_mesh_independently() {
        let left = rect(0.0, 0.0, 2.0, 2.0);
        let right = rect(4.0, 0.0, 2.0, 2.0);
        let both = apply_boolean(&left, &right, BooleanOp::Union);
        assert_eq!(both.polygon_count(), 2);
        let mut mesh = KernelMesh::default();
        discretize(&both, 0.5, &mut mesh).unwrap();
        assert!((mesh_area(&mesh) - 8.0).abs() < 1e-9);
        assert!(mesh.nodes.iter().all(|p| p.x <= 2.0 + 1e-12 || p.x >= 4.0 - 1e-12));
    }
}
