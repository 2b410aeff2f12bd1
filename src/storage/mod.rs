//! Record store contract used by the services, plus in-memory and JSON-file backends.
//!
//! Rows travel as JSON objects keyed by column name, mirroring a hosted relational
//! store. Typed access goes through [`Record`] and the helpers in this module.

pub mod json_backend;
pub mod memory;

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use chrono::DateTime;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{BillingTransaction, LineItem, Payment, Registration, Vendor};
use crate::errors::LedgerError;

pub use json_backend::JsonStore;
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Tables exposed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Vendors,
    LineItems,
    BillingTransactions,
    Payments,
    Registrations,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Vendors,
        Table::LineItems,
        Table::BillingTransactions,
        Table::Payments,
        Table::Registrations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Vendors => "vendors",
            Table::LineItems => "line_items",
            Table::BillingTransactions => "billing_transactions",
            Table::Payments => "payments",
            Table::Registrations => "registrations",
        }
    }

    /// Singular name of the entity stored in this table.
    pub fn entity_name(self) -> &'static str {
        match self {
            Table::Vendors => "vendor",
            Table::LineItems => "line item",
            Table::BillingTransactions => "billing transaction",
            Table::Payments => "payment",
            Table::Registrations => "registration",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filters plus an optional ordering column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// True when every filter column of `row` equals the filter value. Missing columns read as null.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| row.get(field).unwrap_or(&Value::Null) == expected)
    }

    /// Sorts rows in place according to `order_by`; a no-op without one.
    pub fn sort(&self, rows: &mut [Value]) {
        if let Some((field, direction)) = &self.order_by {
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(field).unwrap_or(&Value::Null),
                    b.get(field).unwrap_or(&Value::Null),
                );
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
    }
}

/// Orders nulls first, then booleans, numbers and strings; other values compare equal.
/// Strings that are both RFC 3339 timestamps compare chronologically.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Abstraction over a remote relational store with per-row CRUD.
///
/// Implementations must tolerate many concurrent `insert` calls and report each
/// call's outcome independently.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>>;

    /// Inserts one row, filling `id` and `created_at` when absent, and returns the stored row.
    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    /// Merges `changes` into the row identified by `id`.
    async fn update(&self, table: Table, id: Uuid, changes: Map<String, Value>) -> Result<Value>;

    async fn delete(&self, table: Table, id: Uuid) -> Result<()>;

    /// Deletes every row matching the query filters and returns how many were removed.
    async fn delete_where(&self, table: Table, query: &Query) -> Result<usize>;
}

/// A typed row living in a specific table.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: Table;
}

impl Record for Vendor {
    const TABLE: Table = Table::Vendors;
}

impl Record for LineItem {
    const TABLE: Table = Table::LineItems;
}

impl Record for BillingTransaction {
    const TABLE: Table = Table::BillingTransactions;
}

impl Record for Payment {
    const TABLE: Table = Table::Payments;
}

impl Record for Registration {
    const TABLE: Table = Table::Registrations;
}

fn decode<R: Record>(row: Value) -> Result<R> {
    serde_json::from_value(row).map_err(|err| {
        LedgerError::InvalidRecord(format!("{} row could not be decoded: {}", R::TABLE, err))
    })
}

pub async fn fetch<R: Record>(store: &dyn RecordStore, query: &Query) -> Result<Vec<R>> {
    store
        .select(R::TABLE, query)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn fetch_all<R: Record>(store: &dyn RecordStore) -> Result<Vec<R>> {
    fetch(store, &Query::all()).await
}

pub async fn fetch_one<R: Record>(store: &dyn RecordStore, id: Uuid) -> Result<R> {
    let query = Query::all().eq("id", id.to_string());
    let row = store
        .select(R::TABLE, &query)
        .await?
        .into_iter()
        .next()
        .ok_or(LedgerError::NotFound { table: R::TABLE, id })?;
    decode(row)
}

pub async fn insert_record<R: Record>(store: &dyn RecordStore, record: &R) -> Result<R> {
    let row = serde_json::to_value(record)?;
    decode(store.insert(R::TABLE, row).await?)
}

pub async fn update_record<R: Record>(
    store: &dyn RecordStore,
    id: Uuid,
    changes: Map<String, Value>,
) -> Result<R> {
    decode(store.update(R::TABLE, id, changes).await?)
}

/// Reads the `id` column of a row.
pub fn row_id(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}
