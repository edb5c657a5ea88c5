//! Joinable Domain Layer
//!
//! This crate contains the core data model for the joinable relationship
//! graph. It defines the fundamental concepts, value objects, and trait
//! interfaces that the storage and engine layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Entity**: any typed object with a stable type name and id; declares
//!   which relationship capabilities it supports
//! - **JoinRecord**: one directed edge-observation; a live join between two
//!   entities is a symmetric pair of records
//! - **EdgeFilter / Page**: query criteria understood by the storage layer
//! - **Pipeline**: project/match/skip/limit aggregation stages for
//!   storage-side row shaping
//! - **History token**: string-encoded `(type, id)` pair recorded in an
//!   append-only log independent of live edges
//!
//! ## Architecture
//!
//! - Value objects and trait definitions only
//! - No storage or engine logic; infrastructure lives in other crates
//! - The [`traits::JoinStore`] trait is the single seam to persistence

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edge;
pub mod entity;
pub mod filter;
pub mod history;
pub mod pipeline;
pub mod traits;

// Re-exports for convenience
pub use edge::{EdgeId, EdgeSide, JoinRecord};
pub use entity::{canonical_type_name, is_valid_type_name, Capabilities, Entity, EntityRef};
pub use filter::{EdgeFilter, Page};
pub use history::{history_token, parse_history_token, HistoryKind, TokenError};
pub use pipeline::{PipelineStage, Row};
pub use traits::JoinStore;
