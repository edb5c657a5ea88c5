//! Joinable Relationship Engine
//!
//! Generic bidirectional join layer over a [`joinable_domain::JoinStore`].
//! Any entity type can initiate relationships (joiner), receive them
//! (joined), or both; the engine keeps the symmetric record pair for every
//! live join, an append-only history log, and the aggregate queries on top.
//!
//! # Overview
//!
//! - **Join / unjoin**: symmetric two-record writes with duplicate and
//!   self-join suppression, optional target predicates
//! - **Neighbor queries**: typed joinee/joiner listings, counts, and
//!   common-neighbor intersections, all materialized through the batched
//!   [`resolver`]
//! - **History**: per-entity append-only logs that survive unjoin, with
//!   rebuild and membership operations
//! - **Ranking**: class-level max/min join-count queries with explicit
//!   empty-collection errors
//! - **Reconcile**: detection and repair of half-written edge pairs
//!
//! # Consistency
//!
//! The engine performs multiple non-atomic writes per logical operation
//! and relies on the store's per-operation atomicity; reads are not
//! isolated from concurrent writers. A crash between the two writes of a
//! pair leaves a half-edge, repairable via [`JoinEngine::reconcile`].
//!
//! # Usage
//!
//! ```no_run
//! use joinable_engine::JoinEngine;
//! use joinable_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new(":memory:")?;
//! // store.register(...) entity codecs, store.put_entity(...) documents
//! let mut engine = JoinEngine::new(store);
//! // engine.join(&user, &[&group])?, engine.all_joiners(&group, None)?, ...
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod engine;
mod error;
mod history;
mod joined;
mod joiner;
mod ranking;
mod reconcile;
pub mod resolver;

pub use engine::JoinEngine;
pub use error::{JoinError, Result};
pub use reconcile::Reconciliation;
