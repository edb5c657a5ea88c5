//! Class-level ranking queries - entities with extreme join counts.

use crate::engine::JoinEngine;
use crate::error::{JoinError, Result};
use joinable_domain::{canonical_type_name, EdgeFilter, EdgeSide, Entity, EntityRef, JoinStore};

#[derive(Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

impl<S: JoinStore> JoinEngine<S>
where
    S::Error: std::fmt::Display,
{
    /// Entities of `type_name` tied at the maximum joinee count.
    pub fn with_max_joinees(&self, type_name: &str) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joining, None, Extreme::Max)
    }

    /// Entities of `type_name` tied at the minimum joinee count.
    pub fn with_min_joinees(&self, type_name: &str) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joining, None, Extreme::Min)
    }

    /// Maximum joinee count, counting only partners of `partner_type`.
    pub fn with_max_joinees_by_type(
        &self,
        type_name: &str,
        partner_type: &str,
    ) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joining, Some(partner_type), Extreme::Max)
    }

    /// Minimum joinee count, counting only partners of `partner_type`.
    pub fn with_min_joinees_by_type(
        &self,
        type_name: &str,
        partner_type: &str,
    ) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joining, Some(partner_type), Extreme::Min)
    }

    /// Entities of `type_name` tied at the maximum joiner count.
    pub fn with_max_joiners(&self, type_name: &str) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joinable, None, Extreme::Max)
    }

    /// Entities of `type_name` tied at the minimum joiner count.
    pub fn with_min_joiners(&self, type_name: &str) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joinable, None, Extreme::Min)
    }

    /// Maximum joiner count, counting only partners of `partner_type`.
    pub fn with_max_joiners_by_type(
        &self,
        type_name: &str,
        partner_type: &str,
    ) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joinable, Some(partner_type), Extreme::Max)
    }

    /// Minimum joiner count, counting only partners of `partner_type`.
    pub fn with_min_joiners_by_type(
        &self,
        type_name: &str,
        partner_type: &str,
    ) -> Result<Vec<Box<dyn Entity>>> {
        self.ranked(type_name, EdgeSide::Joinable, Some(partner_type), Extreme::Min)
    }

    /// Shared ranking implementation.
    ///
    /// Loads every entity of the class, sorts ascending by count (stable),
    /// takes the extreme value from the last (max) or first (min) element,
    /// and returns all entities tied at that value. An empty class is an
    /// explicit error, never a silent empty result.
    fn ranked(
        &self,
        type_name: &str,
        side: EdgeSide,
        partner_type: Option<&str>,
        extreme: Extreme,
    ) -> Result<Vec<Box<dyn Entity>>> {
        let canonical = canonical_type_name(type_name);
        if !self.store.is_registered(&canonical) {
            return Err(JoinError::UnknownType(canonical));
        }

        let entities = self.store.all_of_type(&canonical).map_err(JoinError::store)?;
        if entities.is_empty() {
            return Err(JoinError::EmptyCollection(canonical));
        }

        let mut counted: Vec<(u64, Box<dyn Entity>)> = Vec::with_capacity(entities.len());
        for entity in entities {
            let owner = EntityRef::of(entity.as_ref());
            let mut filter = match side {
                EdgeSide::Joining => EdgeFilter::joinees_of(owner),
                EdgeSide::Joinable => EdgeFilter::joiners_of(owner),
            };
            if let Some(partner) = partner_type {
                filter = filter.by_type(partner);
            }
            let count = self.store.count_edges(&filter).map_err(JoinError::store)?;
            counted.push((count, entity));
        }

        counted.sort_by_key(|(count, _)| *count);
        let extreme_count = match extreme {
            Extreme::Max => counted[counted.len() - 1].0,
            Extreme::Min => counted[0].0,
        };

        Ok(counted
            .into_iter()
            .filter(|(count, _)| *count == extreme_count)
            .map(|(_, entity)| entity)
            .collect())
    }
}
