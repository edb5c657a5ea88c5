//! Pipeline stage translation
//!
//! Turns a project/match/skip/limit stage sequence into a single SQL query
//! over the `joins` table. Stages are validated in caller order: a
//! projection narrows the visible columns, a match may only reference
//! visible columns, and no match may follow skip/limit and no skip may
//! follow limit (SQL applies WHERE before OFFSET before LIMIT, so
//! accepting those orders would silently reorder the stages).

use crate::StoreError;
use joinable_domain::pipeline::fields;
use joinable_domain::PipelineStage;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

const ALL_COLUMNS: [&str; 5] = [
    fields::SIDE,
    fields::OWNER_TYPE,
    fields::OWNER_ID,
    fields::F_TYPE,
    fields::F_ID,
];

/// A translated pipeline: one SQL statement plus its parameters and the
/// final projected column names.
pub(crate) struct PipelinePlan {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub columns: Vec<String>,
}

pub(crate) fn plan(stages: &[PipelineStage]) -> Result<PipelinePlan, StoreError> {
    let mut visible: Vec<String> = ALL_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    let mut wheres: Vec<String> = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();
    let mut skip: Option<u64> = None;
    let mut limit: Option<u64> = None;

    for stage in stages {
        match stage {
            PipelineStage::Project(columns) => {
                for column in columns {
                    if !visible.contains(column) {
                        return Err(StoreError::InvalidData(format!(
                            "projection references unknown or hidden column: {column}"
                        )));
                    }
                }
                visible = columns.clone();
            }
            PipelineStage::Match(conditions) => {
                if skip.is_some() || limit.is_some() {
                    return Err(StoreError::InvalidData(
                        "match stage after skip/limit is not supported".to_string(),
                    ));
                }
                for (column, value) in conditions {
                    if !visible.contains(column) {
                        return Err(StoreError::InvalidData(format!(
                            "match references unknown or hidden column: {column}"
                        )));
                    }
                    let Value::String(s) = value else {
                        return Err(StoreError::InvalidData(format!(
                            "match value for {column} must be a string"
                        )));
                    };
                    wheres.push(format!("{column} = ?"));
                    params.push(SqlValue::Text(s.clone()));
                }
            }
            PipelineStage::Skip(n) => {
                // SQL applies OFFSET before LIMIT, so a skip after a limit
                // cannot be expressed in one query without reordering it.
                if limit.is_some() {
                    return Err(StoreError::InvalidData(
                        "skip stage after limit is not supported".to_string(),
                    ));
                }
                skip = Some(skip.unwrap_or(0) + n);
            }
            PipelineStage::Limit(n) => {
                limit = Some(limit.map_or(*n, |current| current.min(*n)));
            }
        }
    }

    let mut sql = format!("SELECT {} FROM joins", visible.join(", "));
    if !wheres.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&wheres.join(" AND "));
    }
    // UUIDv7 ids sort chronologically, so pagination windows are stable.
    sql.push_str(" ORDER BY id");
    if skip.is_some() || limit.is_some() {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(SqlValue::Integer(
            limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX)),
        ));
        params.push(SqlValue::Integer(
            skip.map_or(0, |n| i64::try_from(n).unwrap_or(i64::MAX)),
        ));
    }

    Ok(PipelinePlan {
        sql,
        params,
        columns: visible,
    })
}
