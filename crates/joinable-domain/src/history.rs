//! History tokens - string-encoded endpoints in the append-only log
//!
//! Every join event appends a `"<TypeName>_<id>"` token to each side that
//! records history. Tokens are never deduplicated and survive unjoin; the
//! log is an audit trail, not a mirror of live edges.

use crate::entity::EntityRef;
use std::fmt;
use thiserror::Error;

/// Which history sequence a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    /// Outbound log (`join_history`): entities this owner ever joined.
    Join,

    /// Inbound log (`joined_history`): entities that ever joined this owner.
    Joined,
}

impl HistoryKind {
    /// Storage string form of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Joined => "joined",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from history-token parsing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// The token cannot be split into a non-empty (type, id) pair.
    #[error("ambiguous history token: {0:?}")]
    Ambiguous(String),
}

/// Encode an entity reference as a history token.
pub fn history_token(target: &EntityRef) -> String {
    format!("{}_{}", target.type_name, target.id)
}

/// Parse a history token back into an entity reference.
///
/// The token is split at the FIRST underscore: type names are validated to
/// be `_`-free at registration, so everything after that underscore is the
/// id, even when the id itself contains underscores. A token with no
/// underscore or an empty half is ambiguous.
pub fn parse_history_token(token: &str) -> Result<EntityRef, TokenError> {
    match token.split_once('_') {
        Some((type_name, id)) if !type_name.is_empty() && !id.is_empty() => {
            Ok(EntityRef::new(type_name, id))
        }
        _ => Err(TokenError::Ambiguous(token.to_string())),
    }
}
