//! Aggregation pipeline surface for storage-side row shaping
//!
//! The joined side's paginated listing does not materialize full records;
//! it asks the store to project only the columns it needs, match, and
//! paginate in one pass. Stages are applied in caller order.

use serde_json::Value;

/// Column names visible to pipeline stages.
pub mod fields {
    /// Record side column.
    pub const SIDE: &str = "side";
    /// Owning entity type column.
    pub const OWNER_TYPE: &str = "owner_type";
    /// Owning entity id column.
    pub const OWNER_ID: &str = "owner_id";
    /// Target type column.
    pub const F_TYPE: &str = "f_type";
    /// Target id column.
    pub const F_ID: &str = "f_id";
}

/// One row produced by a pipeline run: projected column name → value.
pub type Row = serde_json::Map<String, Value>;

/// A single aggregation stage.
///
/// The store evaluates stages sequentially, so a `Match` may only
/// reference columns still visible under the projections that precede it.
#[derive(Debug, Clone)]
pub enum PipelineStage {
    /// Narrow the visible columns to exactly the named ones.
    Project(Vec<String>),

    /// Keep rows where every named column equals the given value.
    Match(Vec<(String, Value)>),

    /// Drop the first `n` rows.
    Skip(u64),

    /// Keep at most `n` rows.
    Limit(u64),
}

impl PipelineStage {
    /// Convenience constructor for a projection stage.
    pub fn project(columns: &[&str]) -> Self {
        Self::Project(columns.iter().map(|c| (*c).to_string()).collect())
    }

    /// Convenience constructor for an equality-match stage.
    pub fn matching(conditions: &[(&str, &str)]) -> Self {
        Self::Match(
            conditions
                .iter()
                .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
                .collect(),
        )
    }
}
