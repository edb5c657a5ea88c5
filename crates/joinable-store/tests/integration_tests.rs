//! Integration tests for joinable-store
//!
//! These tests verify the full CRUD cycle for entities, join records,
//! history sequences, and the aggregation pipeline.

use joinable_domain::pipeline::fields;
use joinable_domain::{
    Capabilities, EdgeFilter, EdgeSide, Entity, EntityRef, HistoryKind, JoinRecord, JoinStore,
    Page, PipelineStage,
};
use joinable_store::{EntityCodec, SqliteStore, StoreError};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
struct Account {
    id: String,
    email: String,
}

impl Entity for Account {
    fn type_name(&self) -> &str {
        "Account"
    }
    fn id(&self) -> &str {
        &self.id
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }
}

struct AccountCodec;

impl EntityCodec for AccountCodec {
    fn type_name(&self) -> &str {
        "Account"
    }
    fn decode(&self, id: &str, doc: &Value) -> Result<Box<dyn Entity>, StoreError> {
        let email = doc
            .get("email")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::InvalidData(format!("account {id} missing email")))?;
        Ok(Box::new(Account {
            id: id.to_string(),
            email: email.to_string(),
        }))
    }
}

fn store() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.register(Box::new(AccountCodec)).unwrap();
    store
}

fn edge(side: EdgeSide, owner: (&str, &str), target: (&str, &str)) -> JoinRecord {
    JoinRecord::new(
        side,
        EntityRef::new(owner.0, owner.1),
        EntityRef::new(target.0, target.1),
    )
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_entity_round_trip() {
    let mut store = store();
    store
        .put_entity("Account", "a1", &json!({"email": "a1@example.com"}))
        .unwrap();

    let found = store.get_entity(&EntityRef::new("Account", "a1")).unwrap();
    let entity = found.expect("entity should be present");
    assert_eq!(entity.type_name(), "Account");
    assert_eq!(entity.id(), "a1");

    let missing = store.get_entity(&EntityRef::new("Account", "nope")).unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_put_entity_requires_registered_type() {
    let mut store = store();
    match store.put_entity("Ghost", "g1", &json!({})) {
        Err(StoreError::UnknownType(name)) => assert_eq!(name, "Ghost"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_decode_failure_surfaces() {
    let mut store = store();
    store.put_entity("Account", "bad", &json!({})).unwrap();

    match store.get_entity(&EntityRef::new("Account", "bad")).err() {
        Some(StoreError::InvalidData(msg)) => assert!(msg.contains("bad")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_find_by_ids_of_type() {
    let mut store = store();
    for id in ["a1", "a2", "a3"] {
        store
            .put_entity("Account", id, &json!({"email": format!("{id}@example.com")}))
            .unwrap();
    }

    let found = store
        .find_by_ids_of_type(
            "Account",
            &["a3".to_string(), "a1".to_string(), "missing".to_string()],
        )
        .unwrap();
    let mut ids: Vec<&str> = found.iter().map(|e| e.id()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a1", "a3"]);

    assert!(store.find_by_ids_of_type("Account", &[]).unwrap().is_empty());

    match store.find_by_ids_of_type("Ghost", &["x".to_string()]).err() {
        Some(StoreError::UnknownType(name)) => assert_eq!(name, "Ghost"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_all_of_type_in_id_order() {
    let mut store = store();
    for id in ["b", "a", "c"] {
        store
            .put_entity("Account", id, &json!({"email": format!("{id}@example.com")}))
            .unwrap();
    }

    let all = store.all_of_type("Account").unwrap();
    let ids: Vec<&str> = all.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn test_edge_crud_and_filters() {
    let mut store = store();

    let e1 = edge(EdgeSide::Joining, ("User", "u"), ("Group", "g1"));
    let e2 = edge(EdgeSide::Joining, ("User", "u"), ("User", "v"));
    let e3 = edge(EdgeSide::Joinable, ("Group", "g1"), ("User", "u"));
    for record in [&e1, &e2, &e3] {
        store.create_edge(record).unwrap();
    }

    let owner = EntityRef::new("User", "u");
    assert_eq!(
        store.count_edges(&EdgeFilter::joinees_of(owner.clone())).unwrap(),
        2
    );
    assert_eq!(
        store
            .count_edges(&EdgeFilter::joinees_of(owner.clone()).by_type("group"))
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .count_edges(
                &EdgeFilter::joinees_of(owner.clone()).by_model(&EntityRef::new("User", "v"))
            )
            .unwrap(),
        1
    );

    let in_filter = EdgeFilter {
        target_id_in: Some(vec!["g1".to_string(), "v".to_string()]),
        ..EdgeFilter::joinees_of(owner.clone())
    };
    assert_eq!(store.count_edges(&in_filter).unwrap(), 2);

    let limited = store
        .query_edges(&EdgeFilter::joinees_of(owner.clone()), Page::limit(1))
        .unwrap();
    assert_eq!(limited.len(), 1);

    let windowed = store
        .query_edges(&EdgeFilter::joinees_of(owner.clone()), Page::window(1, 5))
        .unwrap();
    assert_eq!(windowed.len(), 1);

    store.delete_edge(e2.id).unwrap();
    assert_eq!(
        store.count_edges(&EdgeFilter::joinees_of(owner)).unwrap(),
        1
    );

    match store.delete_edge(e2.id).err() {
        Some(StoreError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_pipeline_end_to_end() {
    let mut store = store();
    for i in 0..5 {
        store
            .create_edge(&edge(
                EdgeSide::Joinable,
                ("Group", "g"),
                ("User", &format!("u{i}")),
            ))
            .unwrap();
    }
    // A row for a different owner, excluded by the match stage
    store
        .create_edge(&edge(EdgeSide::Joinable, ("Group", "h"), ("User", "x")))
        .unwrap();

    let rows = store
        .run_pipeline(&[
            PipelineStage::matching(&[
                (fields::OWNER_TYPE, "Group"),
                (fields::OWNER_ID, "g"),
                (fields::SIDE, "joinable"),
            ]),
            PipelineStage::Skip(2),
            PipelineStage::Limit(2),
            PipelineStage::project(&[fields::F_ID]),
        ])
        .unwrap();

    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.len(), 1, "only the projected column should remain");
        assert!(row.contains_key(fields::F_ID));
    }
}

#[test]
fn test_history_preserves_append_order() {
    let mut store = store();
    let owner = EntityRef::new("Account", "a1");

    for token in ["User_1", "Group_9", "User_1"] {
        store
            .append_history(&owner, HistoryKind::Join, token)
            .unwrap();
    }
    store
        .append_history(&owner, HistoryKind::Joined, "User_2")
        .unwrap();

    // Duplicates are kept and order is append order
    assert_eq!(
        store.history(&owner, HistoryKind::Join).unwrap(),
        vec!["User_1", "Group_9", "User_1"]
    );

    store.clear_history(&owner, HistoryKind::Join).unwrap();
    assert!(store.history(&owner, HistoryKind::Join).unwrap().is_empty());
    // The other sequence is untouched
    assert_eq!(
        store.history(&owner, HistoryKind::Joined).unwrap(),
        vec!["User_2"]
    );
}

#[test]
fn test_delete_entity_cascades_owned_rows() {
    let mut store = store();
    store
        .put_entity("Account", "a1", &json!({"email": "a1@example.com"}))
        .unwrap();

    let owner = EntityRef::new("Account", "a1");
    store
        .create_edge(&edge(EdgeSide::Joining, ("Account", "a1"), ("User", "v")))
        .unwrap();
    let foreign = edge(EdgeSide::Joinable, ("User", "v"), ("Account", "a1"));
    store.create_edge(&foreign).unwrap();
    store
        .append_history(&owner, HistoryKind::Join, "User_v")
        .unwrap();

    store.delete_entity(&owner).unwrap();

    assert!(store.get_entity(&owner).unwrap().is_none());
    assert_eq!(
        store.count_edges(&EdgeFilter::joinees_of(owner.clone())).unwrap(),
        0
    );
    assert!(store.history(&owner, HistoryKind::Join).unwrap().is_empty());
    // Rows owned by other entities are not cascaded
    assert_eq!(
        store
            .count_edges(&EdgeFilter::joiners_of(EntityRef::new("User", "v")))
            .unwrap(),
        1
    );

    match store.delete_entity(&owner).err() {
        Some(StoreError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

struct Widget(String);

impl Entity for Widget {
    fn type_name(&self) -> &str {
        "Widget"
    }
    fn id(&self) -> &str {
        &self.0
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }
}

struct LowercaseWidgetCodec;

impl EntityCodec for LowercaseWidgetCodec {
    fn type_name(&self) -> &str {
        "widget"
    }
    fn decode(&self, id: &str, _doc: &Value) -> Result<Box<dyn Entity>, StoreError> {
        Ok(Box::new(Widget(id.to_string())))
    }
}

#[test]
fn test_lowercase_codec_name_is_canonicalized() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.register(Box::new(LowercaseWidgetCodec)).unwrap();

    store.put_entity("widget", "w1", &json!({})).unwrap();

    // EntityRef always carries the canonical name; rows written through a
    // lowercase codec must still be found under it.
    let found = store.get_entity(&EntityRef::new("Widget", "w1")).unwrap();
    assert!(found.is_some());

    let all = store.all_of_type("widget").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id(), "w1");

    let by_ids = store
        .find_by_ids_of_type("Widget", &["w1".to_string()])
        .unwrap();
    assert_eq!(by_ids.len(), 1);

    store.delete_entity(&EntityRef::new("widget", "w1")).unwrap();
    assert!(store
        .get_entity(&EntityRef::new("Widget", "w1"))
        .unwrap()
        .is_none());
}

#[test]
fn test_on_disk_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("joinable.db");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.register(Box::new(AccountCodec)).unwrap();
        store
            .put_entity("Account", "a1", &json!({"email": "a1@example.com"}))
            .unwrap();
        store
            .create_edge(&edge(EdgeSide::Joining, ("Account", "a1"), ("User", "v")))
            .unwrap();
    }

    // Reopen: data survives, the registry is per-process and re-registered
    let mut store = SqliteStore::new(&path).unwrap();
    store.register(Box::new(AccountCodec)).unwrap();

    assert!(store
        .get_entity(&EntityRef::new("Account", "a1"))
        .unwrap()
        .is_some());
    assert_eq!(
        store
            .count_edges(&EdgeFilter::joinees_of(EntityRef::new("Account", "a1")))
            .unwrap(),
        1
    );
}
