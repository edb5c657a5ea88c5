//! Entity identity and capability declarations

use std::fmt;

/// A polymorphic reference to an entity: canonical type name plus string id.
///
/// Two references are equal iff both the type name and the id are equal;
/// this is the identity rule used everywhere in the engine (self-join
/// detection, set intersection, history membership).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// Canonical (capitalized) type name, e.g. `"User"`.
    pub type_name: String,

    /// Stable string id within the type.
    pub id: String,
}

impl EntityRef {
    /// Create a reference from a raw type name and id.
    ///
    /// The type name is canonicalized, so `"user"` and `"User"` produce
    /// equal references.
    pub fn new(type_name: &str, id: &str) -> Self {
        Self {
            type_name: canonical_type_name(type_name),
            id: id.to_string(),
        }
    }

    /// Create a reference identifying the given entity.
    pub fn of(entity: &dyn Entity) -> Self {
        Self::new(entity.type_name(), entity.id())
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_name, self.id)
    }
}

/// Canonicalize a type name: uppercase the first ASCII character.
///
/// Stored `f_type` columns always carry the canonical form, so lookups by
/// `"group"` and `"Group"` hit the same rows.
pub fn canonical_type_name(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Whether a type name is acceptable for registration.
///
/// Type names must be non-empty and must not contain `_`: history tokens
/// are encoded as `type_id` and parsed by splitting at the first
/// underscore, so an underscore in the type name would make tokens
/// ambiguous.
pub fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('_')
}

/// Relationship capabilities an entity type declares.
///
/// Replaces runtime "responds to" probing: the engine consults these flags
/// before creating edges or touching history, and refuses operations on
/// entities that do not declare the required capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Can initiate joins (owns outbound edges).
    pub joiner: bool,

    /// Can receive joins (owns inbound edges).
    pub joined: bool,

    /// Records outbound join history.
    pub join_history: bool,

    /// Records inbound join history.
    pub joined_history: bool,
}

impl Capabilities {
    /// All four capabilities enabled.
    pub const fn all() -> Self {
        Self {
            joiner: true,
            joined: true,
            join_history: true,
            joined_history: true,
        }
    }
}

/// A typed entity participating in the relationship graph.
///
/// The graph core is deliberately ignorant of what an entity *is*; it only
/// needs a stable `(type, id)` identity and the declared capabilities.
/// Concrete types (users, groups, …) live outside this crate and are
/// materialized by the storage layer's registry.
pub trait Entity {
    /// Canonical type name, e.g. `"User"`. Must not contain `_`.
    fn type_name(&self) -> &str;

    /// Stable id, unique within the type.
    fn id(&self) -> &str;

    /// Declared relationship capabilities.
    fn capabilities(&self) -> Capabilities;
}
