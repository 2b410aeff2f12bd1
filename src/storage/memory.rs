use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::LedgerError;

use super::{row_id, Query, RecordStore, Result, Table};

pub type Tables = BTreeMap<Table, Vec<Value>>;

/// Insert filter used to simulate a store refusing specific rows.
#[derive(Debug, Clone)]
struct Rejection {
    table: Table,
    field: String,
    value: Value,
}

/// Process-local store keeping every table in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    rejections: RwLock<Vec<Rejection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            rejections: RwLock::new(Vec::new()),
        }
    }

    /// Copy of every table, used for persistence.
    pub async fn dump(&self) -> Tables {
        self.tables.read().await.clone()
    }

    /// Replaces every table with `tables`, undoing mutations made since a [`Self::dump`].
    pub async fn restore(&self, tables: Tables) {
        *self.tables.write().await = tables;
    }

    pub async fn row_count(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }

    /// Makes subsequent inserts into `table` fail when the row's `field` equals `value`.
    pub async fn reject_inserts_where(
        &self,
        table: Table,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.rejections.write().await.push(Rejection {
            table,
            field: field.into(),
            value: value.into(),
        });
    }

    async fn check_rejections(&self, table: Table, row: &Value) -> Result<()> {
        let rejections = self.rejections.read().await;
        let refused = rejections.iter().find(|rule| {
            rule.table == table && row.get(&rule.field).unwrap_or(&Value::Null) == &rule.value
        });
        match refused {
            Some(rule) => Err(LedgerError::Rejected {
                table,
                reason: format!("insert refused for {} = {}", rule.field, rule.value),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let Value::Object(mut fields) = row else {
            return Err(LedgerError::InvalidRecord(format!(
                "{table} rows must be JSON objects"
            )));
        };
        if fields.get("id").map_or(true, Value::is_null) {
            fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        if fields.get("created_at").map_or(true, Value::is_null) {
            fields.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
        }
        let row = Value::Object(fields);
        self.check_rejections(table, &row).await?;
        let id = row_id(&row)
            .ok_or_else(|| LedgerError::InvalidRecord(format!("{table} row has a malformed id")))?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        if rows.iter().any(|existing| row_id(existing) == Some(id)) {
            return Err(LedgerError::Rejected {
                table,
                reason: format!("duplicate id {id}"),
            });
        }
        rows.push(row.clone());
        tracing::debug!(%table, %id, "row inserted");
        Ok(row)
    }

    async fn update(&self, table: Table, id: Uuid, mut changes: Map<String, Value>) -> Result<Value> {
        changes.remove("id");
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or(LedgerError::NotFound { table, id })?;
        if let Value::Object(fields) = row {
            fields.extend(changes);
        }
        tracing::debug!(%table, %id, "row updated");
        Ok(row.clone())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id));
        if rows.len() == before {
            return Err(LedgerError::NotFound { table, id });
        }
        tracing::debug!(%table, %id, "row deleted");
        Ok(())
    }

    async fn delete_where(&self, table: Table, query: &Query) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| !query.matches(row));
        let removed = before - rows.len();
        tracing::debug!(%table, removed, "rows deleted by filter");
        Ok(removed)
    }
}
