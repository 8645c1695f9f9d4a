//! Builds a channel with a cylindrical obstacle, meshes it and prints
//! finite-volume statistics.
//!
//! Usage:
//! ```text
//! cargo run --example domain              # one refinement pass
//! cargo run --example domain -- 3         # three refinement passes
//! RUST_LOG=fvdomain=debug cargo run --example domain
//! ```

use fvdomain::geometry::{Circle, Rectangle};
use fvdomain::{Domain, FvError};

fn main() -> Result<(), FvError> {
    // Default: WARN for everything, INFO for fvdomain.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("fvdomain=info".parse().unwrap_or_default())
        .add_directive("domain=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let passes = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<usize>().ok())
        .unwrap_or(1);

    let mut domain = Domain::new()?;
    let channel = domain.add_rectangle(Rectangle::new(10.0, 5.0))?;
    let obstacle = domain.add_circle(Circle::new(1.0).at(-2.0, 0.0))?;
    let fluid = domain.difference(channel, obstacle)?;

    let record = domain.record(fluid)?;
    tracing::info!(name = %record.name, area = record.boundary.area(), "domain built");

    domain.generate()?;
    if passes > 0 {
        domain.refine(passes)?;
    }

    let mesh = domain.half_edge_mesh()?;
    let boundary_vertices = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_boundary(v).unwrap_or(false))
        .count();
    let max_degree = mesh
        .vertex_ids()
        .filter_map(|v| mesh.degree(v).ok())
        .max()
        .unwrap_or(0);

    tracing::info!(
        vertices = mesh.vertex_count(),
        cells = mesh.face_count(),
        boundary_vertices,
        boundary_loops = mesh.boundary_loops().len(),
        max_degree,
        total_volume = mesh.total_volume(),
        "mesh ready"
    );
    Ok(())
}
