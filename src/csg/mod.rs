//! Boolean operations on registered shapes.
//!
//! Each operation runs as one transaction over a [`Domain`](crate::Domain):
//! the boolean result is computed first, the mesh layer is updated, and only
//! then are the inputs replaced in the registry. Any failure leaves both
//! sides untouched.

mod difference;
mod engine;
mod fold;
mod intersection;
mod union;

pub use difference::Difference;
pub use fold::{IntersectAll, UnionAll};
pub use intersection::Intersection;
pub use union::Union;
