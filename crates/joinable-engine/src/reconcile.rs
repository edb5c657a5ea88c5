//! Half-edge detection and repair.
//!
//! A join or unjoin performs two non-transactional writes; a crash between
//! them leaves one direction of the pair on disk. `reconcile` is the
//! explicit repair path: it removes the dangling half so the pair reads as
//! cleanly unjoined again.

use crate::engine::JoinEngine;
use crate::error::{JoinError, Result};
use joinable_domain::{EdgeFilter, Entity, EntityRef, JoinStore, Page};

/// Outcome of a reconcile pass over one (source, target) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Dangling outbound (source-side) records removed.
    pub removed_outbound: u64,

    /// Dangling inbound (target-side) records removed.
    pub removed_inbound: u64,
}

impl Reconciliation {
    /// Whether anything was repaired.
    pub fn repaired(&self) -> bool {
        self.removed_outbound + self.removed_inbound > 0
    }
}

impl<S: JoinStore> JoinEngine<S>
where
    S::Error: std::fmt::Display,
{
    /// Repair a half-written edge in the `source` → `target` direction.
    ///
    /// Inspects the forward records (source's joinees pointing at target)
    /// and the reverse records (target's joiners pointing at source). When
    /// exactly one side exists the edge is half-written and the dangling
    /// records are deleted. A fully-joined or fully-absent pair is left
    /// untouched. The opposite direction is an independent pair; call
    /// again with the arguments swapped to cover it.
    pub fn reconcile(&mut self, source: &dyn Entity, target: &dyn Entity) -> Result<Reconciliation> {
        let source_ref = EntityRef::of(source);
        let target_ref = EntityRef::of(target);

        let forward = self
            .store
            .query_edges(
                &EdgeFilter::joinees_of(source_ref.clone()).by_model(&target_ref),
                Page::all(),
            )
            .map_err(JoinError::store)?;
        let reverse = self
            .store
            .query_edges(
                &EdgeFilter::joiners_of(target_ref.clone()).by_model(&source_ref),
                Page::all(),
            )
            .map_err(JoinError::store)?;

        let mut outcome = Reconciliation::default();
        if forward.is_empty() == reverse.is_empty() {
            return Ok(outcome);
        }

        for record in &forward {
            self.store
                .delete_edge(record.id)
                .map_err(JoinError::store)?;
            outcome.removed_outbound += 1;
        }
        for record in &reverse {
            self.store
                .delete_edge(record.id)
                .map_err(JoinError::store)?;
            outcome.removed_inbound += 1;
        }

        tracing::info!(
            source = %source_ref,
            target = %target_ref,
            removed_outbound = outcome.removed_outbound,
            removed_inbound = outcome.removed_inbound,
            "removed dangling half-edge"
        );
        Ok(outcome)
    }
}
