use geo::{Area, BoundingRect, Contains, Coord, LineString, MultiPolygon, Polygon, Validation};

use crate::error::{GeometryError, Result};
use crate::math::{Point2, TOLERANCE};

/// An axis-aligned bounding box in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point2,
    /// Maximum corner of the bounding box.
    pub max: Point2,
}

impl Aabb {
    /// Returns the smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Extent along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Boundary representation of a 2D region: a set of polygons, each with an
/// outer ring and optional holes.
///
/// An empty boundary is a valid value (e.g. the intersection of two disjoint
/// shapes).
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    shape: MultiPolygon<f64>,
}

/// One polygon of a boundary as open rings (no repeated closing point).
#[derive(Debug, Clone)]
pub struct Rings {
    /// The outer ring.
    pub exterior: Vec<Point2>,
    /// Hole rings.
    pub holes: Vec<Vec<Point2>>,
}

impl Boundary {
    /// Creates an empty boundary.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            shape: MultiPolygon::new(Vec::new()),
        }
    }

    /// Wraps an existing multi-polygon.
    #[must_use]
    pub fn from_multi_polygon(shape: MultiPolygon<f64>) -> Self {
        Self { shape }
    }

    /// Creates a single-polygon boundary from a closed ring of points.
    ///
    /// The ring may or may not repeat its first point at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is non-finite, if the ring has
    /// fewer than 3 distinct points, or if it encloses no area.
    pub fn from_ring(points: &[Point2]) -> Result<Self> {
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GeometryError::NonFinite("polygon ring").into());
        }
        let ring = open_ring(points);
        if ring.len() < 3 {
            return Err(GeometryError::Degenerate(format!(
                "polygon needs at least 3 distinct points, got {}",
                ring.len()
            ))
            .into());
        }
        let coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
        let polygon = Polygon::new(LineString::from(coords), Vec::new());
        polygon
            .check_validation()
            .map_err(|e| GeometryError::Degenerate(format!("invalid polygon: {e}")))?;
        if polygon.unsigned_area() < TOLERANCE {
            return Err(GeometryError::Degenerate("polygon encloses no area".into()).into());
        }
        Ok(Self {
            shape: MultiPolygon::new(vec![polygon]),
        })
    }

    /// Returns the underlying multi-polygon.
    #[must_use]
    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Total enclosed area (holes subtracted).
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    /// Returns `true` if the boundary encloses no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty() || self.area() <= TOLERANCE
    }

    /// Number of disjoint polygons in the boundary.
    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.shape.0.len()
    }

    /// Axis-aligned bounds, or `None` for an empty boundary.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.shape.bounding_rect().map(|rect| Aabb {
            min: Point2::new(rect.min().x, rect.min().y),
            max: Point2::new(rect.max().x, rect.max().y),
        })
    }

    /// Returns `true` if `point` lies strictly inside the region.
    #[must_use]
    pub fn contains_point(&self, point: &Point2) -> bool {
        self.shape.contains(&geo::Point::new(point.x, point.y))
    }

    /// Returns every polygon as open rings.
    #[must_use]
    pub fn rings(&self) -> Vec<Rings> {
        self.shape
            .0
            .iter()
            .map(|polygon| Rings {
                exterior: line_string_points(polygon.exterior()),
                holes: polygon.interiors().iter().map(line_string_points).collect(),
            })
            .collect()
    }
}

fn line_string_points(line: &LineString<f64>) -> Vec<Point2> {
    let points: Vec<Point2> = line.coords().map(|c| Point2::new(c.x, c.y)).collect();
    open_ring(&points)
}

/// Drops consecutive duplicates and the closing point of a ring.
fn open_ring(points: &[Point2]) -> Vec<Point2> {
    let mut ring: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if ring.last().is_some_and(|last| (last - p).norm() < TOLERANCE) {
            continue;
        }
        ring.push(*p);
    }
    while ring.len() > 1 && (ring[0] - ring[ring.len() - 1]).norm() < TOLERANCE {
        ring.pop();
    }
    ring
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::FvError;

    fn square(x0: f64, y0: f64, side: f64) -> Boundary {
        Boundary::from_ring(&[
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ])
        .unwrap()
    }

    #[test]
    fn ring_area_and_bounds() {
        let b = square(1.0, 2.0, 3.0);
        assert!((b.area() - 9.0).abs() < TOLERANCE);
        let bounds = b.bounds().unwrap();
        assert_eq!(bounds.min, Point2::new(1.0, 2.0));
        assert_eq!(bounds.max, Point2::new(4.0, 5.0));
    }

    #[test]
    fn closing_point_is_dropped() {
        let b = Boundary::from_ring(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(b.rings()[0].exterior.len(), 3);
    }

    #[test]
    fn too_few_points_rejected() {
        let err = Boundary::from_ring(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(err.is_err());
    }

    #[test]
    fn collinear_ring_rejected() {
        let err = Boundary::from_ring(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn bowtie_rejected() {
        let err = Boundary::from_ring(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!(matches!(
            err,
            Err(FvError::Geometry(GeometryError::Degenerate(reason)))
                if reason.contains("self-intersection")
        ));
    }

    #[test]
    fn nan_rejected() {
        let err = Boundary::from_ring(&[
            Point2::new(0.0, 0.0),
            Point2::new(f64::NAN, 0.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!(matches!(
            err,
            Err(crate::FvError::Geometry(GeometryError::NonFinite(_)))
        ));
    }

    #[test]
    fn empty_boundary_has_no_bounds() {
        let b = Boundary::empty();
        assert!(b.is_empty());
        assert!(b.bounds().is_none());
        assert_eq!(b.polygon_count(), 0);
    }

    #[test]
    fn containment_is_strict() {
        let b = square(0.0, 0.0, 2.0);
        assert!(b.contains_point(&Point2::new(1.0, 1.0)));
        assert!(!b.contains_point(&Point2::new(3.0, 1.0)));
    }

    #[test]
    fn aabb_union() {
        let a = square(0.0, 0.0, 1.0).bounds().unwrap();
        let b = square(2.0, -1.0, 1.0).bounds().unwrap();
        let u = a.union(&b);
        assert!((u.width() - 3.0).abs() < TOLERANCE);
        assert!((u.height() - 2.0).abs() < TOLERANCE);
    }
}
