//! Error types for engine operations.

use joinable_domain::TokenError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, JoinError>;

/// Errors that can occur during relationship engine operations.
#[derive(Debug, Error)]
pub enum JoinError {
    /// Resolver given a type name with no registered entity resolver
    #[error("Unknown entity type: {0}")]
    UnknownType(String),

    /// Ranking query invoked on a zero-element collection
    #[error("Ranking query on empty collection: {0}")]
    EmptyCollection(String),

    /// One side of a join/unjoin pair was written and the paired write
    /// failed without a successful rollback; repair via `reconcile`
    #[error("Partial edge between {joining} and {target}: {detail}")]
    PartialEdge {
        /// Joining-side entity.
        joining: String,
        /// Joinable-side entity.
        target: String,
        /// Underlying storage failure.
        detail: String,
    },

    /// A history token could not be split into a (type, id) pair
    #[error("Ambiguous history token: {0:?}")]
    AmbiguousHistoryToken(String),

    /// Operation invoked on an entity that does not declare the required
    /// capability
    #[error("Entity {entity} does not declare the {capability} capability")]
    MissingCapability {
        /// Entity the operation was invoked on.
        entity: String,
        /// Capability the operation requires.
        capability: &'static str,
    },

    /// Storage layer error, propagated unmodified; the engine never retries
    #[error("Storage error: {0}")]
    Store(String),
}

impl JoinError {
    /// Wrap a storage-layer failure.
    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<TokenError> for JoinError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Ambiguous(token) => Self::AmbiguousHistoryToken(token),
        }
    }
}
