use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::{Point2, TOLERANCE};

use super::Boundary;

/// Parameters controlling how curved primitives are turned into polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryParams {
    /// Maximum allowed chord deviation from the true curve.
    pub tolerance: f64,
    /// Minimum number of segments for a full circle.
    pub min_segments: usize,
    /// Maximum number of segments for a full circle.
    pub max_segments: usize,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            min_segments: 8,
            max_segments: 512,
        }
    }
}

impl GeometryParams {
    /// Sets the chord tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Number of segments used to approximate a full circle of `radius`.
    ///
    /// From the sagitta formula `s = r (1 - cos(θ/2))`, clamped to
    /// `[min_segments, max_segments]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn circle_segments(&self, radius: f64) -> usize {
        if radius > self.tolerance && self.tolerance > 0.0 {
            let half_angle = (1.0 - self.tolerance / radius).acos();
            let computed = (TAU / (2.0 * half_angle)).ceil() as usize;
            computed.clamp(self.min_segments, self.max_segments)
        } else {
            self.min_segments
        }
    }
}

/// An axis-aligned rectangle given by its center and extents.
#[derive(Debug, Clone, Copy)]
pub struct Rectangle {
    /// Center point.
    pub center: Point2,
    /// Extent along x.
    pub length: f64,
    /// Extent along y.
    pub height: f64,
}

impl Rectangle {
    /// Creates a rectangle centered at the origin.
    #[must_use]
    pub fn new(length: f64, height: f64) -> Self {
        Self {
            center: Point2::origin(),
            length,
            height,
        }
    }

    /// Creates a square centered at the origin.
    #[must_use]
    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }

    /// Moves the rectangle's center.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.center = Point2::new(x, y);
        self
    }

    /// Lower-left corner.
    #[must_use]
    pub fn corner(&self) -> Point2 {
        Point2::new(
            self.center.x - self.length * 0.5,
            self.center.y - self.height * 0.5,
        )
    }

    /// Counter-clockwise corner points starting at the lower-left corner.
    #[must_use]
    pub fn points(&self) -> Vec<Point2> {
        let c = self.corner();
        vec![
            c,
            Point2::new(c.x + self.length, c.y),
            Point2::new(c.x + self.length, c.y + self.height),
            Point2::new(c.x, c.y + self.height),
        ]
    }
}

/// A circle given by its center and radius.
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    /// Center point.
    pub center: Point2,
    /// Radius.
    pub radius: f64,
}

impl Circle {
    /// Creates a circle centered at the origin.
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self {
            center: Point2::origin(),
            radius,
        }
    }

    /// Moves the circle's center.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.center = Point2::new(x, y);
        self
    }

    /// Polygonal approximation, counter-clockwise.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn points(&self, params: &GeometryParams) -> Vec<Point2> {
        let n = params.circle_segments(self.radius);
        (0..n)
            .map(|i| {
                let t = TAU * i as f64 / n as f64;
                Point2::new(
                    self.center.x + self.radius * t.cos(),
                    self.center.y + self.radius * t.sin(),
                )
            })
            .collect()
    }
}

/// A primitive shape that can be added to a domain.
#[derive(Debug, Clone)]
pub enum Primitive {
    Rectangle(Rectangle),
    Square(Rectangle),
    Circle(Circle),
    Polygon(Vec<Point2>),
}

impl Primitive {
    /// Display name of the primitive kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Rectangle(_) => "Rectangle",
            Primitive::Square(_) => "Square",
            Primitive::Circle(_) => "Circle",
            Primitive::Polygon(_) => "Polygon",
        }
    }

    /// Checks sizes and coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if a size is non-positive or a coordinate is not finite.
    pub fn validate(&self) -> Result<()> {
        match self {
            Primitive::Rectangle(rect) | Primitive::Square(rect) => {
                check_finite(&[rect.center.x, rect.center.y, rect.length, rect.height])?;
                if rect.length < TOLERANCE || rect.height < TOLERANCE {
                    return Err(GeometryError::Degenerate(format!(
                        "rectangle extents must be positive, got {} x {}",
                        rect.length, rect.height
                    ))
                    .into());
                }
            }
            Primitive::Circle(circle) => {
                check_finite(&[circle.center.x, circle.center.y, circle.radius])?;
                if circle.radius < TOLERANCE {
                    return Err(GeometryError::Degenerate(format!(
                        "circle radius must be positive, got {}",
                        circle.radius
                    ))
                    .into());
                }
            }
            Primitive::Polygon(points) => {
                Boundary::from_ring(points)?;
            }
        }
        Ok(())
    }

    /// Builds the boundary representation of the primitive.
    ///
    /// # Errors
    ///
    /// Returns an error if the primitive is degenerate.
    pub fn to_boundary(&self, params: &GeometryParams) -> Result<Boundary> {
        self.validate()?;
        match self {
            Primitive::Rectangle(rect) | Primitive::Square(rect) => {
                Boundary::from_ring(&rect.points())
            }
            Primitive::Circle(circle) => Boundary::from_ring(&circle.points(params)),
            Primitive::Polygon(points) => Boundary::from_ring(points),
        }
    }
}

fn check_finite(values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::NonFinite("primitive parameters").into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn rectangle_is_centered() {
        let rect = Rectangle::new(10.0, 5.0);
        assert_eq!(rect.corner(), Point2::new(-5.0, -2.5));
        let b = Primitive::Rectangle(rect)
            .to_boundary(&GeometryParams::default())
            .unwrap();
        assert!((b.area() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn circle_area_within_chord_tolerance() {
        let params = GeometryParams::default();
        let b = Primitive::Circle(Circle::new(1.0).at(-2.0, 0.0))
            .to_boundary(&params)
            .unwrap();
        assert!((b.area() - PI).abs() < 1e-2);
        let bounds = b.bounds().unwrap();
        assert!((bounds.min.x + 3.0).abs() < 1e-9);
    }

    #[test]
    fn segment_count_grows_with_radius() {
        let params = GeometryParams::default();
        assert!(params.circle_segments(10.0) > params.circle_segments(1.0));
        assert_eq!(params.circle_segments(1e-6), params.min_segments);
        assert!(params.circle_segments(1e6) <= params.max_segments);
    }

    #[test]
    fn non_positive_sizes_rejected() {
        assert!(Primitive::Rectangle(Rectangle::new(0.0, 1.0)).validate().is_err());
        assert!(Primitive::Circle(Circle::new(-1.0)).validate().is_err());
        assert!(Primitive::Square(Rectangle::square(f64::INFINITY))
            .validate()
            .is_err());
    }
}
