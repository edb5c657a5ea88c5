//! Trait definitions for external interactions
//!
//! These traits define the boundary between the relationship engine and
//! the persistence infrastructure. Implementations live in other crates.

use crate::edge::{EdgeId, JoinRecord};
use crate::entity::{Entity, EntityRef};
use crate::filter::{EdgeFilter, Page};
use crate::history::HistoryKind;
use crate::pipeline::{PipelineStage, Row};

/// Storage interface required by the relationship engine.
///
/// The engine performs multiple non-atomic writes per logical operation
/// and relies entirely on the store's per-operation atomicity; there is no
/// cross-write transaction at this seam. Implemented by the infrastructure
/// layer (joinable-store).
pub trait JoinStore {
    /// Error type for store operations.
    type Error;

    /// Persist one join record; returns its id as a handle.
    fn create_edge(&mut self, record: &JoinRecord) -> Result<EdgeId, Self::Error>;

    /// Delete a join record by id.
    fn delete_edge(&mut self, id: EdgeId) -> Result<(), Self::Error>;

    /// Query join records matching the filter, with optional pagination.
    fn query_edges(&self, filter: &EdgeFilter, page: Page) -> Result<Vec<JoinRecord>, Self::Error>;

    /// Count join records matching the filter.
    fn count_edges(&self, filter: &EdgeFilter) -> Result<u64, Self::Error>;

    /// Run a project/match/skip/limit pipeline over the join collection.
    ///
    /// Stages apply in caller order; a match stage may only reference
    /// columns still visible under the preceding projections.
    fn run_pipeline(&self, stages: &[PipelineStage]) -> Result<Vec<Row>, Self::Error>;

    /// Whether a type name has a registered resolver.
    fn is_registered(&self, type_name: &str) -> bool;

    /// Batched typed lookup: all registered entities of `type_name` whose
    /// id appears in `ids`, in found order.
    fn find_by_ids_of_type(
        &self,
        type_name: &str,
        ids: &[String],
    ) -> Result<Vec<Box<dyn Entity>>, Self::Error>;

    /// Every stored entity of the given type.
    fn all_of_type(&self, type_name: &str) -> Result<Vec<Box<dyn Entity>>, Self::Error>;

    /// Append a token to one of the owner's history sequences.
    fn append_history(
        &mut self,
        owner: &EntityRef,
        kind: HistoryKind,
        token: &str,
    ) -> Result<(), Self::Error>;

    /// The owner's history sequence, in append order.
    fn history(&self, owner: &EntityRef, kind: HistoryKind) -> Result<Vec<String>, Self::Error>;

    /// Reset one of the owner's history sequences to empty.
    fn clear_history(&mut self, owner: &EntityRef, kind: HistoryKind) -> Result<(), Self::Error>;
}
