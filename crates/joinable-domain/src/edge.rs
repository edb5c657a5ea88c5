//! Join edges - one record per directed edge-observation

use crate::entity::EntityRef;
use std::fmt;

/// Unique identifier for a join record, based on UUIDv7.
///
/// UUIDv7 gives chronological sortability, 128-bit uniqueness, and
/// coordination-free generation, so the engine can mint ids without a
/// round trip to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(u128);

impl EdgeId {
    /// Generate a new UUIDv7-based EdgeId.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EdgeId from a raw u128 value.
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Get the raw u128 value.
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Which side of a relationship a record belongs to.
///
/// A live join between A and B is two records: a `Joining` record owned by
/// A (A's outbound "joinees" collection) and a `Joinable` record owned by B
/// (B's inbound "joiners" collection). The side is stored explicitly
/// rather than inferred from which back-reference happens to be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSide {
    /// The owner initiated the join; the record lists one of its joinees.
    Joining,

    /// The owner received the join; the record lists one of its joiners.
    Joinable,
}

impl EdgeSide {
    /// Storage string form of the side.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joining => "joining",
            Self::Joinable => "joinable",
        }
    }
}

impl fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed edge-observation.
///
/// The `target` endpoint is persisted under the `f_type` / `f_id` columns
/// for compatibility with existing datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRecord {
    /// Unique record id.
    pub id: EdgeId,

    /// Which collection this record belongs to.
    pub side: EdgeSide,

    /// The entity whose collection this record lives in.
    pub owner: EntityRef,

    /// The other endpoint (`f_type` / `f_id`).
    pub target: EntityRef,
}

impl JoinRecord {
    /// Create a record with a freshly generated id.
    pub fn new(side: EdgeSide, owner: EntityRef, target: EntityRef) -> Self {
        Self {
            id: EdgeId::new(),
            side,
            owner,
            target,
        }
    }
}
