pub mod boolean;
pub mod boundary;
pub mod primitive;

pub use boolean::{apply_boolean, fold_boolean, BooleanOp};
pub use boundary::{Aabb, Boundary};
pub use primitive::{Circle, GeometryParams, Primitive, Rectangle};
