//! Entity type registry
//!
//! Replaces type-name reflection with an explicit map populated at
//! startup: each registered codec knows how to turn a stored JSON document
//! back into a typed entity. Resolution of an unregistered type name is an
//! explicit error, never a runtime probe.

use crate::StoreError;
use joinable_domain::{canonical_type_name, is_valid_type_name, Entity};
use serde_json::Value;
use std::collections::HashMap;

/// Decodes stored documents of one entity type.
///
/// One codec is registered per type name at startup. The codec receives
/// the row id and the JSON document body and returns the typed entity.
pub trait EntityCodec: Send + Sync {
    /// Canonical type name this codec handles. Must not contain `_`.
    fn type_name(&self) -> &str;

    /// Materialize a typed entity from its stored document.
    fn decode(&self, id: &str, doc: &Value) -> Result<Box<dyn Entity>, StoreError>;
}

/// Type name → codec map.
#[derive(Default)]
pub(crate) struct Registry {
    codecs: HashMap<String, Box<dyn EntityCodec>>,
}

impl Registry {
    pub(crate) fn register(&mut self, codec: Box<dyn EntityCodec>) -> Result<(), StoreError> {
        let name = codec.type_name();
        if !is_valid_type_name(name) {
            return Err(StoreError::InvalidType(name.to_string()));
        }
        let canonical = canonical_type_name(name);
        if self.codecs.contains_key(&canonical) {
            return Err(StoreError::DuplicateType(canonical));
        }
        self.codecs.insert(canonical, codec);
        Ok(())
    }

    pub(crate) fn get(&self, type_name: &str) -> Result<&dyn EntityCodec, StoreError> {
        self.codecs
            .get(&canonical_type_name(type_name))
            .map(AsRef::as_ref)
            .ok_or_else(|| StoreError::UnknownType(type_name.to_string()))
    }

    pub(crate) fn contains(&self, type_name: &str) -> bool {
        self.codecs.contains_key(&canonical_type_name(type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinable_domain::Capabilities;

    struct Thing(String);

    impl Entity for Thing {
        fn type_name(&self) -> &str {
            "Thing"
        }
        fn id(&self) -> &str {
            &self.0
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::all()
        }
    }

    struct ThingCodec;

    impl EntityCodec for ThingCodec {
        fn type_name(&self) -> &str {
            "Thing"
        }
        fn decode(&self, id: &str, _doc: &Value) -> Result<Box<dyn Entity>, StoreError> {
            Ok(Box::new(Thing(id.to_string())))
        }
    }

    struct BadNameCodec;

    impl EntityCodec for BadNameCodec {
        fn type_name(&self) -> &str {
            "Power_User"
        }
        fn decode(&self, id: &str, _doc: &Value) -> Result<Box<dyn Entity>, StoreError> {
            Ok(Box::new(Thing(id.to_string())))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::default();
        registry.register(Box::new(ThingCodec)).unwrap();

        assert!(registry.contains("Thing"));
        // Lookup canonicalizes the raw name
        assert!(registry.contains("thing"));
        assert!(registry.get("thing").is_ok());
        assert!(!registry.contains("Other"));
    }

    #[test]
    fn test_unknown_type_is_explicit() {
        let registry = Registry::default();
        match registry.get("Ghost").err() {
            Some(StoreError::UnknownType(name)) => assert_eq!(name, "Ghost"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::default();
        registry.register(Box::new(ThingCodec)).unwrap();

        match registry.register(Box::new(ThingCodec)) {
            Err(StoreError::DuplicateType(name)) => assert_eq!(name, "Thing"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_underscore_type_name_rejected() {
        let mut registry = Registry::default();
        match registry.register(Box::new(BadNameCodec)) {
            Err(StoreError::InvalidType(name)) => assert_eq!(name, "Power_User"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
