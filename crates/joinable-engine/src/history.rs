//! History operations - the append-only join log.
//!
//! History is independent of live edges: tokens survive unjoin and are
//! only removed by an explicit clear. Entities that do not declare the
//! relevant history capability read as empty and clears are no-ops,
//! matching the record-only-if-declared behavior of the write path.

use crate::engine::JoinEngine;
use crate::error::{JoinError, Result};
use crate::resolver;
use joinable_domain::{
    history_token, parse_history_token, Entity, EntityRef, HistoryKind, JoinStore,
};

impl<S: JoinStore> JoinEngine<S>
where
    S::Error: std::fmt::Display,
{
    /// Every entity `source` ever joined, rebuilt from the outbound log.
    ///
    /// Tokens are parsed back into (type, id) pairs and materialized
    /// through the resolver, so ordering follows the resolver's per-type
    /// grouping, not strict append order.
    pub fn ever_join(&self, source: &dyn Entity) -> Result<Vec<Box<dyn Entity>>> {
        if !source.capabilities().join_history {
            return Ok(Vec::new());
        }
        self.rebuild(&EntityRef::of(source), HistoryKind::Join)
    }

    /// Every entity that ever joined `target`, rebuilt from the inbound log.
    pub fn ever_joined(&self, target: &dyn Entity) -> Result<Vec<Box<dyn Entity>>> {
        if !target.capabilities().joined_history {
            return Ok(Vec::new());
        }
        self.rebuild(&EntityRef::of(target), HistoryKind::Joined)
    }

    /// Whether `source`'s outbound log contains `model`.
    ///
    /// A raw-token string comparison; the log is not resolved.
    pub fn ever_join_contains(&self, source: &dyn Entity, model: &dyn Entity) -> Result<bool> {
        if !source.capabilities().join_history {
            return Ok(false);
        }
        self.log_contains(&EntityRef::of(source), HistoryKind::Join, model)
    }

    /// Whether `target`'s inbound log contains `model`.
    pub fn ever_joined_contains(&self, target: &dyn Entity, model: &dyn Entity) -> Result<bool> {
        if !target.capabilities().joined_history {
            return Ok(false);
        }
        self.log_contains(&EntityRef::of(target), HistoryKind::Joined, model)
    }

    /// Clear both history sequences of `entity`.
    pub fn clear_history(&mut self, entity: &dyn Entity) -> Result<()> {
        self.clear_join_history(entity)?;
        self.clear_joined_history(entity)
    }

    /// Clear the outbound log, if `entity` declares it.
    pub fn clear_join_history(&mut self, entity: &dyn Entity) -> Result<()> {
        if entity.capabilities().join_history {
            self.store
                .clear_history(&EntityRef::of(entity), HistoryKind::Join)
                .map_err(JoinError::store)?;
        }
        Ok(())
    }

    /// Clear the inbound log, if `entity` declares it.
    pub fn clear_joined_history(&mut self, entity: &dyn Entity) -> Result<()> {
        if entity.capabilities().joined_history {
            self.store
                .clear_history(&EntityRef::of(entity), HistoryKind::Joined)
                .map_err(JoinError::store)?;
        }
        Ok(())
    }

    fn rebuild(&self, owner: &EntityRef, kind: HistoryKind) -> Result<Vec<Box<dyn Entity>>> {
        let tokens = self
            .store
            .history(owner, kind)
            .map_err(JoinError::store)?;
        let pairs = tokens
            .iter()
            .map(|token| parse_history_token(token))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        resolver::resolve(&self.store, &pairs)
    }

    fn log_contains(
        &self,
        owner: &EntityRef,
        kind: HistoryKind,
        model: &dyn Entity,
    ) -> Result<bool> {
        let token = history_token(&EntityRef::of(model));
        let tokens = self
            .store
            .history(owner, kind)
            .map_err(JoinError::store)?;
        Ok(tokens.contains(&token))
    }
}
