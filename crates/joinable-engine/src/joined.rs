//! Inbound (joined-side) operations.

use crate::engine::JoinEngine;
use crate::error::{JoinError, Result};
use crate::resolver;
use joinable_domain::pipeline::fields;
use joinable_domain::{
    EdgeFilter, EdgeSide, Entity, EntityRef, JoinStore, Page, PipelineStage, Row,
};
use serde_json::value::Value;

fn str_field<'a>(row: &'a Row, field: &str) -> Result<&'a str> {
    row.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| JoinError::Store(format!("pipeline row missing field {field}")))
}

impl<S: JoinStore> JoinEngine<S>
where
    S::Error: std::fmt::Display,
{
    /// Whether `target` is currently joined by anything.
    pub fn is_joined(&self, target: &dyn Entity) -> Result<bool> {
        Ok(self.joiners_count(target)? > 0)
    }

    /// All entities currently joining `target`, via a storage-side
    /// aggregation pipeline, optionally paginated as `(page, per_page)`.
    ///
    /// The pipeline projects only the endpoint columns, matches on the
    /// inbound collection of `target`, applies the pagination window, and
    /// projects down to the endpoint. Each returned row is resolved
    /// against its recorded target type, so heterogeneous joiner sets
    /// come back with their correct concrete types.
    pub fn all_joiners(
        &self,
        target: &dyn Entity,
        pagination: Option<(u64, u64)>,
    ) -> Result<Vec<Box<dyn Entity>>> {
        let target_ref = EntityRef::of(target);

        let mut stages = vec![
            PipelineStage::project(&[
                fields::SIDE,
                fields::OWNER_TYPE,
                fields::OWNER_ID,
                fields::F_TYPE,
                fields::F_ID,
            ]),
            PipelineStage::matching(&[
                (fields::OWNER_ID, target_ref.id.as_str()),
                (fields::OWNER_TYPE, target_ref.type_name.as_str()),
                (fields::SIDE, EdgeSide::Joinable.as_str()),
            ]),
        ];
        if let Some((page, per_page)) = pagination {
            stages.push(PipelineStage::Skip(page * per_page));
            stages.push(PipelineStage::Limit(per_page));
        }
        stages.push(PipelineStage::project(&[fields::F_TYPE, fields::F_ID]));

        let rows = self
            .store
            .run_pipeline(&stages)
            .map_err(JoinError::store)?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            pairs.push(EntityRef::new(
                str_field(row, fields::F_TYPE)?,
                str_field(row, fields::F_ID)?,
            ));
        }
        resolver::resolve(&self.store, &pairs)
    }

    /// Joiners of `target` restricted to one type.
    pub fn joiners_by_type(
        &self,
        target: &dyn Entity,
        type_name: &str,
    ) -> Result<Vec<Box<dyn Entity>>> {
        let rows = self
            .store
            .query_edges(
                &EdgeFilter::joiners_of(EntityRef::of(target)).by_type(type_name),
                Page::all(),
            )
            .map_err(JoinError::store)?;
        let pairs: Vec<EntityRef> = rows.into_iter().map(|r| r.target).collect();
        resolver::resolve(&self.store, &pairs)
    }

    /// Number of inbound records owned by `target`.
    pub fn joiners_count(&self, target: &dyn Entity) -> Result<u64> {
        self.store
            .count_edges(&EdgeFilter::joiners_of(EntityRef::of(target)))
            .map_err(JoinError::store)
    }

    /// Inbound record count restricted to one joiner type.
    pub fn joiners_count_by_type(&self, target: &dyn Entity, type_name: &str) -> Result<u64> {
        self.store
            .count_edges(&EdgeFilter::joiners_of(EntityRef::of(target)).by_type(type_name))
            .map_err(JoinError::store)
    }

    /// Detach each model from `target`, initiated from the joined side.
    ///
    /// Mirror of `unjoin`: per model, skipped unless the pair is fully
    /// joined in both directions.
    pub fn unjoined(&mut self, target: &dyn Entity, models: &[&dyn Entity]) -> Result<()> {
        self.unjoined_where(target, models, |_| true)
    }

    /// [`Self::unjoined`] restricted to models passing the predicate.
    pub fn unjoined_where<F>(
        &mut self,
        target: &dyn Entity,
        models: &[&dyn Entity],
        predicate: F,
    ) -> Result<()>
    where
        F: Fn(&dyn Entity) -> bool,
    {
        Self::require(target, "joined", target.capabilities().joined)?;
        let target_ref = EntityRef::of(target);

        for &model in models {
            if !predicate(model) {
                continue;
            }
            let model_ref = EntityRef::of(model);
            if model_ref == target_ref {
                continue;
            }
            if !self.is_joinee_of(target, model)? || !self.is_joiner_of(model, target)? {
                continue;
            }
            self.delete_edge_pair(&model_ref, &target_ref)?;
            tracing::debug!(source = %model_ref, target = %target_ref, "deleted join edge pair");
        }
        Ok(())
    }

    /// Detach every current joiner from `target`.
    pub fn unjoined_all(&mut self, target: &dyn Entity) -> Result<()> {
        let joiners = self.all_joiners(target, None)?;
        let refs: Vec<&dyn Entity> = joiners.iter().map(AsRef::as_ref).collect();
        self.unjoined(target, &refs)
    }

    /// Whether `a` and `b` share at least one joiner.
    pub fn has_common_joiners(&self, a: &dyn Entity, b: &dyn Entity) -> Result<bool> {
        Ok(!self.common_joiners_with(a, b)?.is_empty())
    }

    /// Joiners shared by `a` and `b`, equality by (type, id), in `a`'s
    /// resolved order.
    pub fn common_joiners_with(
        &self,
        a: &dyn Entity,
        b: &dyn Entity,
    ) -> Result<Vec<Box<dyn Entity>>> {
        let ours = self.resolved_joiners(a)?;
        let theirs = self.resolved_joiners(b)?;
        Ok(Self::intersect(ours, &theirs))
    }

    fn resolved_joiners(&self, target: &dyn Entity) -> Result<Vec<Box<dyn Entity>>> {
        let rows = self
            .store
            .query_edges(
                &EdgeFilter::joiners_of(EntityRef::of(target)),
                Page::all(),
            )
            .map_err(JoinError::store)?;
        let pairs: Vec<EntityRef> = rows.into_iter().map(|r| r.target).collect();
        resolver::resolve(&self.store, &pairs)
    }
}
