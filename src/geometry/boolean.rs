use geo::BooleanOps;

use super::Boundary;

/// The type of boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
}

impl BooleanOp {
    /// Operation name used in names and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "difference",
        }
    }
}

/// Applies a boolean operation to two boundaries.
///
/// The result may be empty; callers decide whether that is acceptable.
#[must_use]
pub fn apply_boolean(a: &Boundary, b: &Boundary, op: BooleanOp) -> Boundary {
    let (a, b) = (a.as_multi_polygon(), b.as_multi_polygon());
    let result = match op {
        BooleanOp::Union => a.union(b),
        BooleanOp::Intersection => a.intersection(b),
        BooleanOp::Difference => a.difference(b),
    };
    Boundary::from_multi_polygon(result)
}

/// Left-folds `op` over `boundaries` in iteration order.
///
/// Intersection stops folding as soon as the accumulator becomes empty,
/// since no later operand can make it non-empty again. Difference subtracts
/// every later operand from the first. Returns `None` for no operands.
pub fn fold_boolean<'a, I>(boundaries: I, op: BooleanOp) -> Option<Boundary>
where
    I: IntoIterator<Item = &'a Boundary>,
{
    let exhausted = |acc: &Boundary| op == BooleanOp::Intersection && acc.is_empty();
    let mut iter = boundaries.into_iter();
    let mut acc = iter.next()?.clone();
    if exhausted(&acc) {
        return Some(Boundary::empty());
    }
    for next in iter {
        acc = apply_boolean(&acc, next, op);
        if exhausted(&acc) {
            break;
        }
    }
    Some(if acc.is_empty() { Boundary::empty() } else { acc })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;

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
    fn disjoint_union_adds_areas() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(5.0, 0.0, 2.0);
        let u = apply_boolean(&a, &b, BooleanOp::Union);
        assert!((u.area() - 5.0).abs() < 1e-9);
        assert_eq!(u.polygon_count(), 2);
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(5.0, 0.0, 2.0);
        assert!(apply_boolean(&a, &b, BooleanOp::Intersection).is_empty());
    }

    #[test]
    fn overlapping_operations() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        assert!((apply_boolean(&a, &b, BooleanOp::Union).area() - 7.0).abs() < 1e-9);
        assert!((apply_boolean(&a, &b, BooleanOp::Intersection).area() - 1.0).abs() < 1e-9);
        assert!((apply_boolean(&a, &b, BooleanOp::Difference).area() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn self_difference_is_empty() {
        let a = square(0.0, 0.0, 2.0);
        assert!(apply_boolean(&a, &a, BooleanOp::Difference).is_empty());
    }

    #[test]
    fn hole_from_difference() {
        let outer = square(0.0, 0.0, 4.0);
        let inner = square(1.0, 1.0, 1.0);
        let d = apply_boolean(&outer, &inner, BooleanOp::Difference);
        assert!((d.area() - 15.0).abs() < 1e-9);
        assert_eq!(d.rings()[0].holes.len(), 1);
    }

    #[test]
    fn fold_intersection_short_circuits() {
        let shapes = [
            square(0.0, 0.0, 1.0),
            square(5.0, 0.0, 1.0),
            square(0.0, 0.0, 1.0),
            square(0.5, 0.0, 1.0),
        ];
        let mut pulled = 0;
        let result = fold_boolean(
            shapes.iter().inspect(|_| pulled += 1),
            BooleanOp::Intersection,
        )
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(pulled, 2);
    }

    #[test]
    fn fold_intersection_with_empty_first_operand() {
        let shapes = [Boundary::empty(), square(0.0, 0.0, 1.0)];
        let mut pulled = 0;
        let result = fold_boolean(
            shapes.iter().inspect(|_| pulled += 1),
            BooleanOp::Intersection,
        )
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(pulled, 1);
    }

    #[test]
    fn fold_union_of_three() {
        let shapes = [
            square(0.0, 0.0, 1.0),
            square(2.0, 0.0, 1.0),
            square(4.0, 0.0, 1.0),
        ];
        let result = fold_boolean(&shapes, BooleanOp::Union).unwrap();
        assert!((result.area() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fold_of_nothing() {
        let shapes: [Boundary; 0] = [];
        assert!(fold_boolean(&shapes, BooleanOp::Union).is_none());
    }
}
