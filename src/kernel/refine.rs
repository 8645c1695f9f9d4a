use std::collections::HashMap;

use tracing::debug;

use crate::error::KernelError;
use crate::halfedge::{ElementKind, HalfEdgeMesh, VertexId};
use crate::math::Point3;

use super::discretize::KernelMesh;
use super::KernelResult;

/// Splits every element into four through its edge midpoints.
///
/// Midpoints are shared between the two elements on either side of an edge,
/// so a conforming mesh stays conforming. Quadrilaterals also gain a center
/// node.
pub(super) fn subdivide(mesh: &KernelMesh) -> KernelMesh {
    let mut nodes = mesh.nodes.clone();
    let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
    let mut elements = Vec::with_capacity(mesh.elements.len() * 4);
    let mut kinds = Vec::with_capacity(mesh.kinds.len() * 4);

    let mut midpoint = |a: usize, b: usize, nodes: &mut Vec<Point3>| -> usize {
        *midpoints.entry(normalize_edge(a, b)).or_insert_with(|| {
            let mid = nodes[a] + (nodes[b] - nodes[a]) * 0.5;
            nodes.push(mid);
            nodes.len() - 1
        })
    };

    for (element, &kind) in mesh.elements.iter().zip(&mesh.kinds) {
        match (kind, element.as_slice()) {
            (ElementKind::Triangle, &[a, b, c]) => {
                let mab = midpoint(a, b, &mut nodes);
                let mbc = midpoint(b, c, &mut nodes);
                let mca = midpoint(c, a, &mut nodes);
                elements.push(vec![a, mab, mca]);
                elements.push(vec![b, mbc, mab]);
                elements.push(vec![c, mca, mbc]);
                elements.push(vec![mab, mbc, mca]);
                kinds.extend([ElementKind::Triangle; 4]);
            }
            (ElementKind::Quadrilateral, &[a, b, c, d]) => {
                let mab = midpoint(a, b, &mut nodes);
                let mbc = midpoint(b, c, &mut nodes);
                let mcd = midpoint(c, d, &mut nodes);
                let mda = midpoint(d, a, &mut nodes);
                let center = Point3::from(
                    (nodes[a].coords + nodes[b].coords + nodes[c].coords + nodes[d].coords) / 4.0,
                );
                nodes.push(center);
                let m = nodes.len() - 1;
                elements.push(vec![a, mab, m, mda]);
                elements.push(vec![mab, b, mbc, m]);
                elements.push(vec![m, mbc, c, mcd]);
                elements.push(vec![mda, m, mcd, d]);
                kinds.extend([ElementKind::Quadrilateral; 4]);
            }
            _ => {
                elements.push(element.clone());
                kinds.push(kind);
            }
        }
    }

    debug!(
        before = mesh.elements.len(),
        after = elements.len(),
        "subdivided mesh"
    );

    KernelMesh {
        nodes,
        elements,
        kinds,
    }
}

/// Moves every interior node to the centroid of its one-ring neighbours.
/// Boundary nodes stay fixed. All nodes move at once from the previous
/// positions.
///
/// # Errors
///
/// Returns `KernelError::Failed` if the mesh connectivity is malformed.
pub(super) fn smooth(mesh: &mut KernelMesh, passes: usize) -> KernelResult<()> {
    for _ in 0..passes {
        let he = HalfEdgeMesh::build(&mesh.nodes, &mesh.elements, &mesh.kinds).map_err(|e| {
            KernelError::Failed {
                operation: "refine",
                reason: e.to_string(),
            }
        })?;
        let mut moved = mesh.nodes.clone();
        for (i, slot) in moved.iter_mut().enumerate() {
            let v = VertexId(i);
            if he.is_boundary(v).unwrap_or(true) {
                continue;
            }
            if let Ok(Some(centroid)) = he.neighbor_centroid(v) {
                *slot = centroid;
            }
        }
        mesh.nodes = moved;
    }
    Ok(())
}

fn normalize_edge(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;

    fn two_triangles() -> KernelMesh {
        KernelMesh {
            nodes: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            elements: vec![vec![0, 1, 2], vec![0, 2, 3]],
            kinds: vec![ElementKind::Triangle; 2],
        }
    }

    fn area(mesh: &KernelMesh) -> f64 {
        mesh.elements
            .iter()
            .map(|e| {
                let pts: Vec<Point3> = e.iter().map(|&i| mesh.nodes[i]).collect();
                signed_area_2d(&pts)
            })
            .sum()
    }

    #[test]
    fn subdivision_shares_midpoints() {
        let fine = subdivide(&two_triangles());
        assert_eq!(fine.elements.len(), 8);
        // 4 corners + 5 distinct edge midpoints
        assert_eq!(fine.nodes.len(), 9);
        assert!((area(&fine) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn subdivided_elements_stay_counter_clockwise() {
        let fine = subdivide(&two_triangles());
        for e in &fine.elements {
            let pts: Vec<Point3> = e.iter().map(|&i| fine.nodes[i]).collect();
            assert!(signed_area_2d(&pts) > 0.0);
        }
    }

    #[test]
    fn quad_subdivision_adds_center() {
        let quad = KernelMesh {
            nodes: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            elements: vec![vec![0, 1, 2, 3]],
            kinds: vec![ElementKind::Quadrilateral],
        };
        let fine = subdivide(&quad);
        assert_eq!(fine.elements.len(), 4);
        assert_eq!(fine.nodes.len(), 9);
        assert!((fine.nodes[8].x - 1.0).abs() < 1e-12);
        assert!((area(&fine) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn smoothing_keeps_boundary_and_centers_interior() {
        // Square fan around an off-center interior node.
        let mut mesh = KernelMesh {
            nodes: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(0.5, 0.7, 0.0),
            ],
            elements: vec![vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4]],
            kinds: vec![ElementKind::Triangle; 4],
        };
        smooth(&mut mesh, 1).unwrap();
        assert!((mesh.nodes[4].x - 1.0).abs() < 1e-12);
        assert!((mesh.nodes[4].y - 1.0).abs() < 1e-12);
        assert!((mesh.nodes[0].x).abs() < 1e-12);
        assert!((area(&mesh) - 4.0).abs() < 1e-12);
    }
}
