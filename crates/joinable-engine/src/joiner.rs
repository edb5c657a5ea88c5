//! Outbound (joiner-side) operations.

use crate::engine::JoinEngine;
use crate::error::{JoinError, Result};
use crate::resolver;
use joinable_domain::{
    history_token, EdgeFilter, EdgeSide, Entity, EntityRef, HistoryKind, JoinRecord, JoinStore,
    Page,
};

impl<S: JoinStore> JoinEngine<S>
where
    S::Error: std::fmt::Display,
{
    /// Join `source` to each target.
    ///
    /// Per target: skipped when it equals `source` or when the pair is
    /// already joined in either direction. Otherwise the target's inbound
    /// record is created, then the source's outbound record, then history
    /// tokens are appended to each side that records history.
    ///
    /// `source` must declare the joiner capability and every (retained)
    /// target the joined capability.
    pub fn join(&mut self, source: &dyn Entity, targets: &[&dyn Entity]) -> Result<()> {
        self.join_where(source, targets, |_| true)
    }

    /// [`Self::join`] restricted to targets passing the predicate.
    pub fn join_where<F>(
        &mut self,
        source: &dyn Entity,
        targets: &[&dyn Entity],
        predicate: F,
    ) -> Result<()>
    where
        F: Fn(&dyn Entity) -> bool,
    {
        Self::require(source, "joiner", source.capabilities().joiner)?;
        let source_ref = EntityRef::of(source);

        for &target in targets {
            if !predicate(target) {
                continue;
            }
            let target_ref = EntityRef::of(target);
            if target_ref == source_ref {
                continue;
            }
            Self::require(target, "joined", target.capabilities().joined)?;
            if self.is_joiner_of(source, target)? || self.is_joinee_of(target, source)? {
                continue;
            }

            let inbound = JoinRecord::new(
                EdgeSide::Joinable,
                target_ref.clone(),
                source_ref.clone(),
            );
            let inbound_id = self.store.create_edge(&inbound).map_err(JoinError::store)?;

            let outbound = JoinRecord::new(
                EdgeSide::Joining,
                source_ref.clone(),
                target_ref.clone(),
            );
            if let Err(err) = self.store.create_edge(&outbound) {
                // Half-edge written: roll the inbound record back.
                return match self.store.delete_edge(inbound_id) {
                    Ok(()) => Err(JoinError::store(err)),
                    Err(rollback) => Err(JoinError::PartialEdge {
                        joining: source_ref.to_string(),
                        target: target_ref.to_string(),
                        detail: format!("create failed ({err}); rollback failed ({rollback})"),
                    }),
                };
            }

            if target.capabilities().joined_history {
                self.store
                    .append_history(&target_ref, HistoryKind::Joined, &history_token(&source_ref))
                    .map_err(JoinError::store)?;
            }
            if source.capabilities().join_history {
                self.store
                    .append_history(&source_ref, HistoryKind::Join, &history_token(&target_ref))
                    .map_err(JoinError::store)?;
            }

            tracing::debug!(source = %source_ref, target = %target_ref, "created join edge pair");
        }
        Ok(())
    }

    /// Unjoin `source` from each target.
    ///
    /// Per target: skipped when it equals `source` or when the pair is not
    /// fully joined in both directions; otherwise the one matching record
    /// on each side is deleted.
    pub fn unjoin(&mut self, source: &dyn Entity, targets: &[&dyn Entity]) -> Result<()> {
        self.unjoin_where(source, targets, |_| true)
    }

    /// [`Self::unjoin`] restricted to targets passing the predicate.
    pub fn unjoin_where<F>(
        &mut self,
        source: &dyn Entity,
        targets: &[&dyn Entity],
        predicate: F,
    ) -> Result<()>
    where
        F: Fn(&dyn Entity) -> bool,
    {
        Self::require(source, "joiner", source.capabilities().joiner)?;
        let source_ref = EntityRef::of(source);

        for &target in targets {
            if !predicate(target) {
                continue;
            }
            let target_ref = EntityRef::of(target);
            if target_ref == source_ref {
                continue;
            }
            if !self.is_joiner_of(source, target)? || !self.is_joinee_of(target, source)? {
                continue;
            }
            self.delete_edge_pair(&source_ref, &target_ref)?;
            tracing::debug!(source = %source_ref, target = %target_ref, "deleted join edge pair");
        }
        Ok(())
    }

    /// Unjoin `source` from every current joinee.
    pub fn unjoin_all(&mut self, source: &dyn Entity) -> Result<()> {
        let joinees = self.all_joinees(source)?;
        let refs: Vec<&dyn Entity> = joinees.iter().map(AsRef::as_ref).collect();
        self.unjoin(source, &refs)
    }

    /// Delete the inbound record then the outbound record of a live pair.
    ///
    /// The records were verified to exist just before this call, but reads
    /// are not isolated from concurrent writers, so a missing record is
    /// tolerated. A failure after the first delete is a partial edge.
    pub(crate) fn delete_edge_pair(
        &mut self,
        source_ref: &EntityRef,
        target_ref: &EntityRef,
    ) -> Result<()> {
        let inbound = self
            .store
            .query_edges(
                &EdgeFilter::joiners_of(target_ref.clone()).by_model(source_ref),
                Page::limit(1),
            )
            .map_err(JoinError::store)?;
        let outbound = self
            .store
            .query_edges(
                &EdgeFilter::joinees_of(source_ref.clone()).by_model(target_ref),
                Page::limit(1),
            )
            .map_err(JoinError::store)?;

        let mut first_deleted = false;
        if let Some(record) = inbound.first() {
            self.store
                .delete_edge(record.id)
                .map_err(JoinError::store)?;
            first_deleted = true;
        }
        if let Some(record) = outbound.first() {
            if let Err(err) = self.store.delete_edge(record.id) {
                if first_deleted {
                    return Err(JoinError::PartialEdge {
                        joining: source_ref.to_string(),
                        target: target_ref.to_string(),
                        detail: format!("second delete failed ({err})"),
                    });
                }
                return Err(JoinError::store(err));
            }
        }
        Ok(())
    }

    /// Whether `source` currently joins anything.
    pub fn is_joining(&self, source: &dyn Entity) -> Result<bool> {
        Ok(self.joinees_count(source)? > 0)
    }

    /// All entities `source` currently joins, materialized through the
    /// resolver (per-type batched, per-type ordering).
    pub fn all_joinees(&self, source: &dyn Entity) -> Result<Vec<Box<dyn Entity>>> {
        let rows = self
            .store
            .query_edges(
                &EdgeFilter::joinees_of(EntityRef::of(source)),
                Page::all(),
            )
            .map_err(JoinError::store)?;
        let pairs: Vec<EntityRef> = rows.into_iter().map(|r| r.target).collect();
        resolver::resolve(&self.store, &pairs)
    }

    /// Joinees of `source` restricted to one target type.
    pub fn joinees_by_type(
        &self,
        source: &dyn Entity,
        type_name: &str,
    ) -> Result<Vec<Box<dyn Entity>>> {
        let rows = self
            .store
            .query_edges(
                &EdgeFilter::joinees_of(EntityRef::of(source)).by_type(type_name),
                Page::all(),
            )
            .map_err(JoinError::store)?;
        let pairs: Vec<EntityRef> = rows.into_iter().map(|r| r.target).collect();
        resolver::resolve(&self.store, &pairs)
    }

    /// Number of outbound records owned by `source`.
    pub fn joinees_count(&self, source: &dyn Entity) -> Result<u64> {
        self.store
            .count_edges(&EdgeFilter::joinees_of(EntityRef::of(source)))
            .map_err(JoinError::store)
    }

    /// Outbound record count restricted to one target type.
    pub fn joinees_count_by_type(&self, source: &dyn Entity, type_name: &str) -> Result<u64> {
        self.store
            .count_edges(&EdgeFilter::joinees_of(EntityRef::of(source)).by_type(type_name))
            .map_err(JoinError::store)
    }

    /// Whether `a` and `b` share at least one joinee.
    pub fn has_common_joinees(&self, a: &dyn Entity, b: &dyn Entity) -> Result<bool> {
        Ok(!self.common_joinees_with(a, b)?.is_empty())
    }

    /// Joinees shared by `a` and `b`, equality by (type, id), in `a`'s
    /// resolved order.
    pub fn common_joinees_with(
        &self,
        a: &dyn Entity,
        b: &dyn Entity,
    ) -> Result<Vec<Box<dyn Entity>>> {
        let ours = self.all_joinees(a)?;
        let theirs = self.all_joinees(b)?;
        Ok(Self::intersect(ours, &theirs))
    }
}
