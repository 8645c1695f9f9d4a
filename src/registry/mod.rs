mod record;

pub use record::{Provenance, ShapeId, ShapeRecord};

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::geometry::{Aabb, Boundary};

/// Owns the live shapes of a domain, keyed by stable id.
///
/// Ids come from a monotonic counter and are never reused, so removing a
/// shape never shifts or invalidates any other id.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    records: BTreeMap<ShapeId, ShapeRecord>,
    next_id: u64,
}

impl ShapeRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next insertion will receive.
    #[must_use]
    pub fn peek_next_id(&self) -> ShapeId {
        ShapeId(self.next_id)
    }

    /// Inserts a primitive boundary and returns its id.
    pub fn add(&mut self, boundary: Boundary, name: impl Into<String>) -> ShapeId {
        self.add_with_provenance(boundary, name, Provenance::Primitive)
    }

    /// Inserts a boundary with explicit provenance and returns its id.
    pub fn add_with_provenance(
        &mut self,
        boundary: Boundary,
        name: impl Into<String>,
        provenance: Provenance,
    ) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        self.records.insert(
            id,
            ShapeRecord {
                id,
                name: name.into(),
                boundary,
                provenance,
            },
        );
        id
    }

    /// Returns the boundary of a shape.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the id is not live.
    pub fn get(&self, id: ShapeId) -> Result<&Boundary> {
        self.record(id).map(|r| &r.boundary)
    }

    /// Returns the full record of a shape.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the id is not live.
    pub fn record(&self, id: ShapeId) -> Result<&ShapeRecord> {
        self.records.get(&id).ok_or_else(|| {
            RegistryError::NotFound {
                id,
                operation: "get",
            }
            .into()
        })
    }

    /// Returns `true` if the id is live.
    #[must_use]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.records.contains_key(&id)
    }

    /// Fails with `NotFound` naming `operation` unless every id is live.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` for the first unknown id.
    pub fn ensure_live(&self, ids: &[ShapeId], operation: &'static str) -> Result<()> {
        match ids.iter().find(|id| !self.records.contains_key(id)) {
            Some(&id) => Err(RegistryError::NotFound { id, operation }.into()),
            None => Ok(()),
        }
    }

    /// Removes a set of shapes atomically: either all are removed or, if any
    /// id is unknown, none are.
    ///
    /// Duplicate ids are removed once. Returns the removed records in id order.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if any id is not live.
    pub fn remove(&mut self, ids: &[ShapeId]) -> Result<Vec<ShapeRecord>> {
        self.ensure_live(ids, "remove")?;
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let removed: Vec<ShapeRecord> = sorted
            .iter()
            .filter_map(|id| self.records.remove(id))
            .collect();
        debug!(count = removed.len(), "removed shapes");
        Ok(removed)
    }

    /// Replaces the boundary of a live shape in place, keeping its id and name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the id is not live.
    pub fn replace(
        &mut self,
        id: ShapeId,
        boundary: Boundary,
        provenance: Provenance,
    ) -> Result<Boundary> {
        let record = self.records.get_mut(&id).ok_or(RegistryError::NotFound {
            id,
            operation: "replace",
        })?;
        record.provenance = provenance;
        Ok(std::mem::replace(&mut record.boundary, boundary))
    }

    /// Removes `consumed` and inserts `boundary` as one step.
    ///
    /// Nothing changes if any consumed id is unknown.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` naming `operation` if any consumed
    /// id is not live.
    pub fn commit(
        &mut self,
        consumed: &[ShapeId],
        boundary: Boundary,
        name: impl Into<String>,
        provenance: Provenance,
        operation: &'static str,
    ) -> Result<ShapeId> {
        self.ensure_live(consumed, operation)?;
        for id in consumed {
            self.records.remove(id);
        }
        Ok(self.add_with_provenance(boundary, name, provenance))
    }

    /// All live records in id order.
    #[must_use]
    pub fn list(&self) -> Vec<&ShapeRecord> {
        self.records.values().collect()
    }

    /// All live ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ShapeId> {
        self.records.keys().copied().collect()
    }

    /// Number of live shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no shapes are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bounding box of the union of all live boundaries, or `None` if no
    /// live shape has any extent.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.records
            .values()
            .filter_map(|r| r.boundary.bounds())
            .reduce(|acc, b| acc.union(&b))
    }
}
