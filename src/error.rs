use thiserror::Error;

use crate::registry::ShapeId;

/// Top-level error type for domain building and meshing.
#[derive(Debug, Error)]
pub enum FvError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Csg(#[from] CsgError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors raised while validating primitive geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("non-finite coordinate in {0}")]
    NonFinite(&'static str),
}

/// Errors raised by the shape registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{operation}: shape {id} not found")]
    NotFound { id: ShapeId, operation: &'static str },

    #[error("{operation}: registry is empty")]
    EmptyRegistry { operation: &'static str },
}

/// Errors raised by boolean (CSG) transactions.
#[derive(Debug, Error)]
pub enum CsgError {
    #[error("{operation} of shapes {ids:?} produced an empty result")]
    EmptyResult {
        operation: &'static str,
        ids: Vec<ShapeId>,
    },
}

/// Errors raised by the discretization kernel or the mesh layer wrapping it.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("{operation}: {reason}")]
    Precondition {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("a discretization kernel session is already active in this process")]
    AlreadyAcquired,

    #[error("{operation}: unknown kernel entity {tag}")]
    UnknownTag { tag: String, operation: &'static str },

    #[error("{operation}: no mesh entity for shape {id}")]
    UnknownEntity { id: ShapeId, operation: &'static str },

    #[error("invalid kernel parameters: {0}")]
    InvalidParameters(String),

    #[error("{operation} failed: {reason}")]
    Failed {
        operation: &'static str,
        reason: String,
    },
}

/// Errors related to half-edge connectivity.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("malformed mesh: {0}")]
    Malformed(String),

    #[error("{kind} {index} not found")]
    NotFound { kind: &'static str, index: usize },
}

/// Convenience type alias for results using [`FvError`].
pub type Result<T> = std::result::Result<T, FvError>;
