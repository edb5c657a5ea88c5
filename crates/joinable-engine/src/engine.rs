//! Core engine type and the shared existence checks.

use crate::error::{JoinError, Result};
use joinable_domain::{EdgeFilter, Entity, EntityRef, JoinStore, Page};
use std::collections::HashSet;

/// The relationship graph engine.
///
/// Wraps a [`JoinStore`] and carries every graph operation: symmetric
/// join/unjoin, neighbor listing and counting, history, ranking, and
/// half-edge reconciliation. Each logical operation performs multiple
/// non-atomic store writes; atomicity is per-write only (see `reconcile`
/// for the repair path).
///
/// # Examples
///
/// ```no_run
/// use joinable_engine::JoinEngine;
/// use joinable_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new(":memory:")?;
/// // register entity codecs on the store, then:
/// let engine = JoinEngine::new(store);
/// # Ok(())
/// # }
/// ```
pub struct JoinEngine<S> {
    pub(crate) store: S,
}

impl<S: JoinStore> JoinEngine<S>
where
    S::Error: std::fmt::Display,
{
    /// Create an engine over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrow the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the engine, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Whether `source` is a joiner of `model`.
    ///
    /// True only when BOTH records of the pair exist: the forward record in
    /// `source`'s joinees and the reverse record in `model`'s joiners. The
    /// check multiplies the two limit-1 counts, so a half-written edge
    /// reads as not joined.
    pub fn is_joiner_of(&self, source: &dyn Entity, model: &dyn Entity) -> Result<bool> {
        self.pair_linked(&EntityRef::of(source), &EntityRef::of(model))
    }

    /// Whether `target` is a joinee of `model` (i.e. `model` joined it).
    ///
    /// Same multiplicative both-records check as [`Self::is_joiner_of`],
    /// viewed from the receiving side.
    pub fn is_joinee_of(&self, target: &dyn Entity, model: &dyn Entity) -> Result<bool> {
        self.pair_linked(&EntityRef::of(model), &EntityRef::of(target))
    }

    /// forward-count × reverse-count > 0, each capped at one row.
    pub(crate) fn pair_linked(&self, source: &EntityRef, target: &EntityRef) -> Result<bool> {
        let forward =
            self.edge_present(&EdgeFilter::joinees_of(source.clone()).by_model(target))?;
        let reverse =
            self.edge_present(&EdgeFilter::joiners_of(target.clone()).by_model(source))?;
        Ok(forward * reverse > 0)
    }

    pub(crate) fn edge_present(&self, filter: &EdgeFilter) -> Result<u64> {
        let rows = self
            .store
            .query_edges(filter, Page::limit(1))
            .map_err(JoinError::store)?;
        Ok(rows.len() as u64)
    }

    pub(crate) fn require(
        entity: &dyn Entity,
        capability: &'static str,
        declared: bool,
    ) -> Result<()> {
        if declared {
            Ok(())
        } else {
            Err(JoinError::MissingCapability {
                entity: EntityRef::of(entity).to_string(),
                capability,
            })
        }
    }

    /// Keep the entities of `ours` whose (type, id) also appears in
    /// `theirs`, preserving the order of `ours`.
    pub(crate) fn intersect(
        ours: Vec<Box<dyn Entity>>,
        theirs: &[Box<dyn Entity>],
    ) -> Vec<Box<dyn Entity>> {
        let theirs_set: HashSet<EntityRef> =
            theirs.iter().map(|e| EntityRef::of(e.as_ref())).collect();
        ours.into_iter()
            .filter(|e| theirs_set.contains(&EntityRef::of(e.as_ref())))
            .collect()
    }
}
