use tracing::debug;

use crate::domain::Domain;
use crate::error::{CsgError, RegistryError, Result};
use crate::geometry::{apply_boolean, fold_boolean, BooleanOp};
use crate::kernel::MeshKernel;
use crate::registry::{Provenance, ShapeId};

/// Runs a two-operand boolean as one transaction.
///
/// Only an intersection may produce an empty shape. Order matters for
/// atomicity: both ids are checked, the result is computed, the mesh layer
/// is updated, and only then is the registry changed. The registry commit cannot fail after the liveness check.
pub(super) fn pairwise_execute<K: MeshKernel>(
    domain: &mut Domain<K>,
    shape_a: ShapeId,
    shape_b: ShapeId,
    op: BooleanOp,
) -> Result<ShapeId> {
    let operation = op.name();
    domain.registry.ensure_live(&[shape_a, shape_b], operation)?;

    let result = apply_boolean(
        domain.registry.get(shape_a)?,
        domain.registry.get(shape_b)?,
        op,
    );
    if op != BooleanOp::Intersection && result.is_empty() {
        return Err(CsgError::EmptyResult {
            operation,
            ids: vec![shape_a, shape_b],
        }
        .into());
    }

    let id = domain.registry.peek_next_id();
    match op {
        BooleanOp::Union => domain.mesh.union(shape_a, shape_b, id)?,
        BooleanOp::Intersection => domain.mesh.intersection(shape_a, shape_b, id)?,
        BooleanOp::Difference => domain.mesh.difference(shape_a, shape_b, id)?,
    };

    let provenance = Provenance::from(op);
    let committed = domain.registry.commit(
        &[shape_a, shape_b],
        result,
        format!("{} {}", provenance.label(), id.0),
        provenance,
        operation,
    )?;
    debug!(operation, %shape_a, %shape_b, result = %committed, "boolean committed");
    Ok(committed)
}

/// Folds `op` over every live shape in id order and replaces the registry
/// with the single result. An empty union is rejected like its pairwise
/// counterpart.
pub(super) fn fold_execute<K: MeshKernel>(
    domain: &mut Domain<K>,
    op: BooleanOp,
) -> Result<ShapeId> {
    let operation = match op {
        BooleanOp::Intersection => "intersect_all",
        BooleanOp::Union | BooleanOp::Difference => "union_all",
    };
    let ids = domain.registry.ids();
    let result = fold_boolean(domain.registry.list().into_iter().map(|r| &r.boundary), op)
        .ok_or(RegistryError::EmptyRegistry { operation })?;
    if op != BooleanOp::Intersection && result.is_empty() {
        return Err(CsgError::EmptyResult { operation, ids }.into());
    }

    let id = domain.registry.peek_next_id();
    match op {
        BooleanOp::Intersection => domain.mesh.intersect_all(id)?,
        BooleanOp::Union | BooleanOp::Difference => domain.mesh.union_all(id)?,
    };

    let provenance = Provenance::from(op);
    let committed = domain.registry.commit(
        &ids,
        result,
        format!("{} {}", provenance.label(), id.0),
        provenance,
        operation,
    )?;
    debug!(operation, inputs = ids.len(), result = %committed, "fold committed");
    Ok(committed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::csg::{Difference, IntersectAll, Intersection, Union, UnionAll};
    use crate::error::{CsgError, RegistryError};
    use crate::geometry::{Circle, Rectangle};
    use crate::registry::{Provenance, ShapeId};
    use crate::test_support::serial;
    use crate::{Domain, FvError};

    #[test]
    fn union_names_result_and_consumes_inputs() {
        let _guard = serial();
        let mut d = Domain::new().unwrap();
        let a = d.add_rectangle(Rectangle::new(2.0, 2.0)).unwrap();
        let b = d.add_rectangle(Rectangle::new(2.0, 2.0).at(1.0, 0.0)).unwrap();
        let u = Union::new(a, b).execute(&mut d).unwrap();
        assert_eq!(u, ShapeId(2));
        let record = d.record(u).unwrap();
        assert_eq!(record.name, "Union 2");
        assert_eq!(record.provenance, Provenance::Union);
        assert!((record.boundary.area() - 6.0).abs() < 1e-9);
        assert_eq!(d.mesh_sync().ids(), vec![u]);
    }

    #[test]
    fn missing_operand_changes_nothing() {
        let _guard = serial();
        let mut d = Domain::new().unwrap();
        let a = d.add_circle(Circle::new(1.0)).unwrap();
        let err = Intersection::new(a, ShapeId(9)).execute(&mut d).unwrap_err();
        assert!(matches!(
            err,
            FvError::Registry(RegistryError::NotFound {
                id: ShapeId(9),
                operation: "intersection"
            })
        ));
        assert_eq!(d.registry().ids(), vec![a]);
        assert_eq!(d.mesh_sync().ids(), vec![a]);
    }

    #[test]
    fn covering_difference_is_empty() {
        let _guard = serial();
        let mut d = Domain::new().unwrap();
        let a = d.add_square(1.0, 0.0, 0.0).unwrap();
        let b = d.add_square(4.0, 0.0, 0.0).unwrap();
        let err = Difference::new(a, b).execute(&mut d).unwrap_err();
        assert!(matches!(err, FvError::Csg(CsgError::EmptyResult { .. })));
        assert_eq!(d.registry().len(), 2);
        assert_eq!(d.mesh_sync().len(), 2);
    }

    #[test]
    fn union_of_empty_shapes_is_rejected() {
        let _guard = serial();
        let mut d = Domain::new().unwrap();
        let a = d.add_square(1.0, 0.0, 0.0).unwrap();
        let b = d.add_square(1.0, 5.0, 0.0).unwrap();
        let e1 = Intersection::new(a, b).execute(&mut d).unwrap();
        let c = d.add_square(1.0, 0.0, 5.0).unwrap();
        let e = d.add_square(1.0, 5.0, 5.0).unwrap();
        let e2 = Intersection::new(c, e).execute(&mut d).unwrap();
        assert!(d.get(e1).unwrap().is_empty());
        assert!(d.get(e2).unwrap().is_empty());

        let err = Union::new(e1, e2).execute(&mut d).unwrap_err();
        assert!(matches!(
            err,
            FvError::Csg(CsgError::EmptyResult { operation: "union", .. })
        ));
        assert_eq!(d.registry().ids(), vec![e1, e2]);
        assert_eq!(d.mesh_sync().ids(), vec![e1, e2]);

        let err = UnionAll::new().execute(&mut d).unwrap_err();
        assert!(matches!(
            err,
            FvError::Csg(CsgError::EmptyResult { operation: "union_all", .. })
        ));
        assert_eq!(d.registry().ids(), vec![e1, e2]);
        assert_eq!(d.mesh_sync().ids(), vec![e1, e2]);
        assert_eq!(d.registry().peek_next_id(), ShapeId(6));
    }

    #[test]
    fn intersect_all_short_circuits_to_empty() {
        let _guard = serial();
        let mut d = Domain::new().unwrap();
        d.add_square(2.0, 0.0, 0.0).unwrap();
        d.add_square(2.0, 10.0, 0.0).unwrap();
        d.add_square(2.0, 0.5, 0.0).unwrap();
        let id = IntersectAll::new().execute(&mut d).unwrap();
        assert_eq!(d.registry().ids(), vec![id]);
        assert!(d.get(id).unwrap().is_empty());
        assert_eq!(d.mesh_sync().ids(), vec![id]);
    }

    #[test]
    fn folds_on_empty_registry_fail() {
        let _guard = serial();
        let mut d = Domain::new().unwrap();
        assert!(matches!(
            UnionAll::new().execute(&mut d),
            Err(FvError::Registry(RegistryError::EmptyRegistry { operation: "union_all" }))
        ));
        assert!(matches!(
            IntersectAll::new().execute(&mut d),
            Err(FvError::Registry(RegistryError::EmptyRegistry { .. }))
        ));
    }
}
