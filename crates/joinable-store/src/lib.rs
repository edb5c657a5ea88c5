//! Joinable Storage Layer
//!
//! Implements the JoinStore trait using SQLite as a small document store.
//!
//! # Architecture
//!
//! - One polymorphic `joins` table holds both directions of every edge,
//!   with an explicit `side` column
//! - `entities` holds one JSON document per registered entity; an explicit
//!   codec registry (populated at startup) materializes typed entities
//! - `history` is the append-only join log, ordered by a sequence column
//!
//! # Examples
//!
//! ```no_run
//! use joinable_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Register codecs, then the store is ready for engine operations
//! ```

#![warn(missing_docs)]

mod pipeline;
mod registry;

pub use registry::EntityCodec;

use joinable_domain::traits::JoinStore;
use joinable_domain::{
    canonical_type_name, EdgeFilter, EdgeId, EdgeSide, Entity, EntityRef, HistoryKind, JoinRecord,
    Page, PipelineStage, Row,
};
use registry::Registry;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No codec registered for the type name
    #[error("Unknown entity type: {0}")]
    UnknownType(String),

    /// A codec for the type name is already registered
    #[error("Entity type already registered: {0}")]
    DuplicateType(String),

    /// Type name rejected at registration (empty or contains `_`)
    #[error("Invalid entity type name: {0}")]
    InvalidType(String),

    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Document serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// SQLite-based implementation of JoinStore.
///
/// Provides persistent storage for entities, join records, and history
/// sequences. Entity types are registered at startup via [`EntityCodec`];
/// looking up an unregistered type is an explicit error.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
    registry: Registry,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path.
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joinable_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("joinable.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self {
            conn,
            registry: Registry::default(),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Register an entity codec.
    ///
    /// Rejects type names containing `_` (they would make history tokens
    /// ambiguous) and duplicate registrations.
    pub fn register(&mut self, codec: Box<dyn EntityCodec>) -> Result<(), StoreError> {
        self.registry.register(codec)
    }

    /// Insert or replace an entity document.
    ///
    /// The type must already be registered.
    pub fn put_entity(&mut self, type_name: &str, id: &str, doc: &Value) -> Result<(), StoreError> {
        let codec = self.registry.get(type_name)?;
        // Rows are keyed by the canonical name so lookups by EntityRef
        // (always canonical) hit them even when the codec declares a
        // lowercase name.
        let type_name = canonical_type_name(codec.type_name());
        let body = serde_json::to_string(doc)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO entities (type_name, id, doc) VALUES (?1, ?2, ?3)",
            params![type_name, id, body],
        )?;
        Ok(())
    }

    /// Fetch one entity by reference, if present.
    pub fn get_entity(&self, entity: &EntityRef) -> Result<Option<Box<dyn Entity>>, StoreError> {
        let codec = self.registry.get(&entity.type_name)?;
        let doc: Option<String> = self
            .conn
            .query_row(
                "SELECT doc FROM entities WHERE type_name = ?1 AND id = ?2",
                params![entity.type_name, entity.id],
                |row| row.get(0),
            )
            .optional()?;

        match doc {
            Some(body) => {
                let value: Value = serde_json::from_str(&body)?;
                Ok(Some(codec.decode(&entity.id, &value)?))
            }
            None => Ok(None),
        }
    }

    /// Delete an entity, cascading its owner-side join records and its
    /// history sequences.
    ///
    /// Records owned by *other* entities that point at the deleted one are
    /// left in place; the engine's reconcile operation is the cleanup path
    /// for those.
    pub fn delete_entity(&mut self, entity: &EntityRef) -> Result<(), StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM entities WHERE type_name = ?1 AND id = ?2",
            params![entity.type_name, entity.id],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound(entity.to_string()));
        }
        self.conn.execute(
            "DELETE FROM joins WHERE owner_type = ?1 AND owner_id = ?2",
            params![entity.type_name, entity.id],
        )?;
        self.conn.execute(
            "DELETE FROM history WHERE owner_type = ?1 AND owner_id = ?2",
            params![entity.type_name, entity.id],
        )?;
        Ok(())
    }

    /// Convert EdgeId to bytes for storage.
    fn edge_id_to_bytes(id: EdgeId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to EdgeId.
    fn bytes_to_edge_id(bytes: &[u8]) -> Result<EdgeId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for EdgeId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(EdgeId::from_value(u128::from_be_bytes(arr)))
    }

    /// Convert string to EdgeSide.
    fn str_to_side(s: &str) -> Result<EdgeSide, StoreError> {
        match s {
            "joining" => Ok(EdgeSide::Joining),
            "joinable" => Ok(EdgeSide::Joinable),
            _ => Err(StoreError::InvalidData(format!("Unknown edge side: {s}"))),
        }
    }

    /// Build the WHERE clause and parameters for an edge filter.
    fn filter_clauses(filter: &EdgeFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(side) = filter.side {
            sql.push_str(" AND side = ?");
            params.push(Box::new(side.as_str().to_string()));
        }
        if let Some(owner) = &filter.owner {
            sql.push_str(" AND owner_type = ? AND owner_id = ?");
            params.push(Box::new(owner.type_name.clone()));
            params.push(Box::new(owner.id.clone()));
        }
        if let Some(target_type) = &filter.target_type {
            sql.push_str(" AND f_type = ?");
            params.push(Box::new(target_type.clone()));
        }
        if let Some(target_id) = &filter.target_id {
            sql.push_str(" AND f_id = ?");
            params.push(Box::new(target_id.clone()));
        }
        if let Some(ids) = &filter.target_id_in {
            let placeholders = vec!["?"; ids.len()].join(", ");
            sql.push_str(&format!(" AND f_id IN ({placeholders})"));
            for id in ids {
                params.push(Box::new(id.clone()));
            }
        }

        (sql, params)
    }

    fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JoinRecord> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let side_str: String = row.get(1)?;

        let id = Self::bytes_to_edge_id(&id_bytes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(e))
        })?;
        let side = Self::str_to_side(&side_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(JoinRecord {
            id,
            side,
            owner: EntityRef {
                type_name: row.get(2)?,
                id: row.get(3)?,
            },
            target: EntityRef {
                type_name: row.get(4)?,
                id: row.get(5)?,
            },
        })
    }
}

impl JoinStore for SqliteStore {
    type Error = StoreError;

    fn create_edge(&mut self, record: &JoinRecord) -> Result<EdgeId, Self::Error> {
        let id_bytes = Self::edge_id_to_bytes(record.id);
        self.conn.execute(
            "INSERT INTO joins (id, side, owner_type, owner_id, f_type, f_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id_bytes,
                record.side.as_str(),
                record.owner.type_name,
                record.owner.id,
                record.target.type_name,
                record.target.id,
            ],
        )?;
        Ok(record.id)
    }

    fn delete_edge(&mut self, id: EdgeId) -> Result<(), Self::Error> {
        let id_bytes = Self::edge_id_to_bytes(id);
        let removed = self
            .conn
            .execute("DELETE FROM joins WHERE id = ?1", params![id_bytes])?;
        if removed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn query_edges(&self, filter: &EdgeFilter, page: Page) -> Result<Vec<JoinRecord>, Self::Error> {
        let (clause, mut params) = Self::filter_clauses(filter);
        let mut sql = format!(
            "SELECT id, side, owner_type, owner_id, f_type, f_id FROM joins{clause} ORDER BY id"
        );
        if page.skip.is_some() || page.limit.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Box::new(
                page.limit.map_or(-1i64, |n| i64::try_from(n).unwrap_or(i64::MAX)),
            ));
            params.push(Box::new(
                page.skip.map_or(0i64, |n| i64::try_from(n).unwrap_or(i64::MAX)),
            ));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let records = stmt
            .query_map(&param_refs[..], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_edges(&self, filter: &EdgeFilter) -> Result<u64, Self::Error> {
        let (clause, params) = Self::filter_clauses(filter);
        let sql = format!("SELECT COUNT(*) FROM joins{clause}");
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = self
            .conn
            .query_row(&sql, &param_refs[..], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn run_pipeline(&self, stages: &[PipelineStage]) -> Result<Vec<Row>, Self::Error> {
        let plan = pipeline::plan(stages)?;
        let mut stmt = self.conn.prepare(&plan.sql)?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(plan.params.iter()), |row| {
                let mut out = Row::new();
                for (i, column) in plan.columns.iter().enumerate() {
                    let value: String = row.get(i)?;
                    out.insert(column.clone(), Value::String(value));
                }
                Ok(out)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn is_registered(&self, type_name: &str) -> bool {
        self.registry.contains(type_name)
    }

    fn find_by_ids_of_type(
        &self,
        type_name: &str,
        ids: &[String],
    ) -> Result<Vec<Box<dyn Entity>>, Self::Error> {
        let codec = self.registry.get(type_name)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, doc FROM entities WHERE type_name = ? AND id IN ({placeholders}) ORDER BY id"
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(canonical_type_name(codec.type_name()))];
        for id in ids {
            params.push(Box::new(id.clone()));
        }
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let docs = stmt
            .query_map(&param_refs[..], |row| {
                let id: String = row.get(0)?;
                let body: String = row.get(1)?;
                Ok((id, body))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entities = Vec::with_capacity(docs.len());
        for (id, body) in docs {
            let value: Value = serde_json::from_str(&body)?;
            entities.push(codec.decode(&id, &value)?);
        }
        Ok(entities)
    }

    fn all_of_type(&self, type_name: &str) -> Result<Vec<Box<dyn Entity>>, Self::Error> {
        let codec = self.registry.get(type_name)?;
        let mut stmt = self
            .conn
            .prepare("SELECT id, doc FROM entities WHERE type_name = ?1 ORDER BY id")?;

        let docs = stmt
            .query_map(params![canonical_type_name(codec.type_name())], |row| {
                let id: String = row.get(0)?;
                let body: String = row.get(1)?;
                Ok((id, body))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entities = Vec::with_capacity(docs.len());
        for (id, body) in docs {
            let value: Value = serde_json::from_str(&body)?;
            entities.push(codec.decode(&id, &value)?);
        }
        Ok(entities)
    }

    fn append_history(
        &mut self,
        owner: &EntityRef,
        kind: HistoryKind,
        token: &str,
    ) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO history (owner_type, owner_id, kind, token) VALUES (?1, ?2, ?3, ?4)",
            params![owner.type_name, owner.id, kind.as_str(), token],
        )?;
        Ok(())
    }

    fn history(&self, owner: &EntityRef, kind: HistoryKind) -> Result<Vec<String>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT token FROM history
             WHERE owner_type = ?1 AND owner_id = ?2 AND kind = ?3 ORDER BY seq",
        )?;
        let tokens = stmt
            .query_map(params![owner.type_name, owner.id, kind.as_str()], |row| {
                row.get(0)
            })?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(tokens)
    }

    fn clear_history(&mut self, owner: &EntityRef, kind: HistoryKind) -> Result<(), Self::Error> {
        self.conn.execute(
            "DELETE FROM history WHERE owner_type = ?1 AND owner_id = ?2 AND kind = ?3",
            params![owner.type_name, owner.id, kind.as_str()],
        )?;
        Ok(())
    }
}
