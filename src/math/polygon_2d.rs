use super::{Point3, Vector3, TOLERANCE};

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Computes the Newell vector area of a closed polygon.
///
/// The direction is the polygon normal (right-hand rule over the vertex
/// order) and the magnitude is twice the enclosed area. Works for planar
/// polygons in any orientation, including non-convex ones.
#[must_use]
pub fn newell_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut v = Vector3::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        v.x += (a.y - b.y) * (a.z + b.z);
        v.y += (a.z - b.z) * (a.x + b.x);
        v.z += (a.x - b.x) * (a.y + b.y);
    }
    v
}

/// Computes the unit normal of a closed polygon, or the zero vector if the
/// polygon is degenerate.
#[must_use]
pub fn polygon_normal(points: &[Point3]) -> Vector3 {
    let v = newell_vector(points);
    let len = v.norm();
    if len < TOLERANCE {
        Vector3::zeros()
    } else {
        v / len
    }
}

/// Computes the area-weighted centroid of a planar polygon.
///
/// Falls back to the vertex average when the polygon has (near) zero area.
#[must_use]
pub fn polygon_centroid(points: &[Point3]) -> Point3 {
    let n = points.len();
    if n == 0 {
        return Point3::origin();
    }
    let normal = polygon_normal(points);
    let origin = points[0];
    let mut weighted = Vector3::zeros();
    let mut total = 0.0;
    // Fan triangulation from the first vertex; signed areas handle concavity.
    for i in 1..n.saturating_sub(1) {
        let a = points[i] - origin;
        let b = points[i + 1] - origin;
        let area = a.cross(&b).dot(&normal) * 0.5;
        weighted += (a + b) / 3.0 * area;
        total += area;
    }
    if total.abs() < TOLERANCE {
        return vertex_average(points);
    }
    origin + weighted / total
}

/// Arithmetic mean of a set of points.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vertex_average(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        let area = signed_area_2d(&unit_square());
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = unit_square();
        pts.reverse();
        let area = signed_area_2d(&pts);
        assert!((area + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!((signed_area_2d(&[Point3::new(0.0, 0.0, 0.0)])).abs() < TOLERANCE);
        assert!((signed_area_2d(&[])).abs() < TOLERANCE);
    }

    #[test]
    fn newell_matches_shoelace_in_plane() {
        let pts = unit_square();
        let v = newell_vector(&pts);
        assert!((v.z * 0.5 - signed_area_2d(&pts)).abs() < TOLERANCE);
        assert!(v.x.abs() < TOLERANCE && v.y.abs() < TOLERANCE);
    }

    #[test]
    fn normal_of_tilted_triangle() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let n = polygon_normal(&pts);
        assert!((n.x - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn centroid_of_l_shape() {
        // Two unit squares side by side plus one on top of the left square.
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let c = polygon_centroid(&pts);
        assert!((c.x - 5.0 / 6.0).abs() < 1e-9);
        assert!((c.y - 5.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_degenerate_falls_back_to_average() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let c = polygon_centroid(&pts);
        assert!((c.x - 1.0).abs() < TOLERANCE);
    }
}
