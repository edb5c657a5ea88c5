//! Shared fixtures for engine integration tests.
//!
//! Two concrete entity types exercise the capability matrix: `User`
//! declares everything, `Group` only receives joins (and records inbound
//! history).

use joinable_domain::{Capabilities, Entity, EntityRef};
use joinable_engine::JoinEngine;
use joinable_store::{EntityCodec, SqliteStore, StoreError};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
}

impl Entity for User {
    fn type_name(&self) -> &str {
        "User"
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
}

impl Entity for Group {
    fn type_name(&self) -> &str {
        "Group"
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            joiner: false,
            joined: true,
            join_history: false,
            joined_history: true,
        }
    }
}

pub struct UserCodec;

impl EntityCodec for UserCodec {
    fn type_name(&self) -> &str {
        "User"
    }
    fn decode(&self, id: &str, _doc: &Value) -> Result<Box<dyn Entity>, StoreError> {
        Ok(Box::new(User { id: id.to_string() }))
    }
}

pub struct GroupCodec;

impl EntityCodec for GroupCodec {
    fn type_name(&self) -> &str {
        "Group"
    }
    fn decode(&self, id: &str, _doc: &Value) -> Result<Box<dyn Entity>, StoreError> {
        Ok(Box::new(Group { id: id.to_string() }))
    }
}

/// A fresh in-memory engine with both codecs registered.
pub fn engine() -> JoinEngine<SqliteStore> {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.register(Box::new(UserCodec)).unwrap();
    store.register(Box::new(GroupCodec)).unwrap();
    JoinEngine::new(store)
}

pub fn put_user(engine: &mut JoinEngine<SqliteStore>, id: &str) -> User {
    engine
        .store_mut()
        .put_entity("User", id, &json!({}))
        .unwrap();
    User { id: id.to_string() }
}

pub fn put_group(engine: &mut JoinEngine<SqliteStore>, id: &str) -> Group {
    engine
        .store_mut()
        .put_entity("Group", id, &json!({}))
        .unwrap();
    Group { id: id.to_string() }
}

/// (type, id) display strings of a resolved entity list, for assertions.
pub fn refs(entities: &[Box<dyn Entity>]) -> Vec<String> {
    entities
        .iter()
        .map(|e| EntityRef::of(e.as_ref()).to_string())
        .collect()
}
