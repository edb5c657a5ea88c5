//! Query criteria for edge lookups

use crate::edge::EdgeSide;
use crate::entity::{canonical_type_name, EntityRef};

/// Filter criteria for querying and counting join records.
///
/// All fields combine conjunctively. Supports equality on every column and
/// set-membership on the target id (`f_id IN [...]`).
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    /// Filter by record side.
    pub side: Option<EdgeSide>,

    /// Filter by owning entity.
    pub owner: Option<EntityRef>,

    /// Filter by target type (`f_type`, canonical form).
    pub target_type: Option<String>,

    /// Filter by target id (`f_id`).
    pub target_id: Option<String>,

    /// Filter by target id membership (`f_id IN [...]`).
    pub target_id_in: Option<Vec<String>>,
}

impl EdgeFilter {
    /// Records in `owner`'s outbound "joinees" collection.
    pub fn joinees_of(owner: EntityRef) -> Self {
        Self {
            side: Some(EdgeSide::Joining),
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// Records in `owner`'s inbound "joiners" collection.
    pub fn joiners_of(owner: EntityRef) -> Self {
        Self {
            side: Some(EdgeSide::Joinable),
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// Restrict to targets of the given type (canonicalized).
    pub fn by_type(mut self, type_name: &str) -> Self {
        self.target_type = Some(canonical_type_name(type_name));
        self
    }

    /// Restrict to the exact target entity.
    pub fn by_model(mut self, target: &EntityRef) -> Self {
        self.target_type = Some(target.type_name.clone());
        self.target_id = Some(target.id.clone());
        self
    }
}

/// Pagination window for edge queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    /// Rows to skip before returning results.
    pub skip: Option<u64>,

    /// Maximum rows to return.
    pub limit: Option<u64>,
}

impl Page {
    /// No pagination: every matching row.
    pub fn all() -> Self {
        Self::default()
    }

    /// At most `n` rows, no skip.
    pub fn limit(n: u64) -> Self {
        Self {
            skip: None,
            limit: Some(n),
        }
    }

    /// Skip `skip` rows, then return at most `limit`.
    pub fn window(skip: u64, limit: u64) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joinees_filter_shape() {
        let owner = EntityRef::new("User", "1");
        let f = EdgeFilter::joinees_of(owner.clone());

        assert_eq!(f.side, Some(EdgeSide::Joining));
        assert_eq!(f.owner, Some(owner));
        assert!(f.target_type.is_none());
    }

    #[test]
    fn test_by_type_canonicalizes() {
        let f = EdgeFilter::joinees_of(EntityRef::new("User", "1")).by_type("group");
        assert_eq!(f.target_type.as_deref(), Some("Group"));
    }

    #[test]
    fn test_by_model_sets_both_target_fields() {
        let target = EntityRef::new("Group", "9");
        let f = EdgeFilter::joiners_of(EntityRef::new("User", "1")).by_model(&target);

        assert_eq!(f.target_type.as_deref(), Some("Group"));
        assert_eq!(f.target_id.as_deref(), Some("9"));
    }
}
