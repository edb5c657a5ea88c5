//! EntityResolver - batched polymorphic (type, id) → entity resolution.

use crate::error::{JoinError, Result};
use joinable_domain::{Entity, EntityRef, JoinStore};
use std::collections::HashMap;

/// Resolve a sequence of (type, id) pairs into typed entities.
///
/// Pairs are grouped by type name (group order follows first appearance in
/// the input) and each group is fetched in one batched store lookup.
///
/// The result is the per-type concatenation of found entities: original
/// interleaved ordering and duplicates across type groups are NOT
/// preserved. Callers that need strict input order must not rely on this
/// operation.
///
/// An unregistered type name fails with [`JoinError::UnknownType`].
pub fn resolve<S: JoinStore>(store: &S, pairs: &[EntityRef]) -> Result<Vec<Box<dyn Entity>>>
where
    S::Error: std::fmt::Display,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for pair in pairs {
        groups
            .entry(pair.type_name.clone())
            .or_insert_with(|| {
                order.push(pair.type_name.clone());
                Vec::new()
            })
            .push(pair.id.clone());
    }

    let mut entities = Vec::with_capacity(pairs.len());
    for type_name in &order {
        if !store.is_registered(type_name) {
            return Err(JoinError::UnknownType(type_name.clone()));
        }
        let ids = &groups[type_name];
        entities.extend(
            store
                .find_by_ids_of_type(type_name, ids)
                .map_err(JoinError::store)?,
        );
    }
    Ok(entities)
}
