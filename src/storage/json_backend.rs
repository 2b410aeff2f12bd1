use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use crate::errors::LedgerError;

use super::memory::{MemoryStore, Tables};
use super::{Query, RecordStore, Result, Table};

const TMP_SUFFIX: &str = "tmp";

pub const STORE_SCHEMA_VERSION: u32 = 1;

/// On-disk layout of a [`JsonStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    schema_version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    tables: Tables,
}

/// Record store persisted to a single JSON file after every mutation.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Opens the store at `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tables = if fs::try_exists(&path).await? {
            let data = fs::read_to_string(&path).await?;
            let file: StoreFile = serde_json::from_str(&data)?;
            if file.schema_version > STORE_SCHEMA_VERSION {
                return Err(LedgerError::InvalidRecord(format!(
                    "store `{}` was written by a newer schema version",
                    path.display()
                )));
            }
            file.tables
        } else {
            Tables::new()
        };
        tracing::info!(path = %path.display(), "opened record store");
        Ok(Self {
            path,
            inner: MemoryStore::with_tables(tables),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current tables to disk. Callers must hold `write_lock`.
    async fn persist(&self) -> Result<()> {
        let file = StoreFile {
            schema_version: STORE_SCHEMA_VERSION,
            saved_at: Utc::now(),
            tables: self.inner.dump().await,
        };
        let json = serde_json::to_string_pretty(&file)?;
        write_atomic(&self.path, &json).await?;
        tracing::debug!(path = %self.path.display(), "record store persisted");
        Ok(())
    }

    /// Persists a mutation, or puts `backup` back in memory when the write fails.
    async fn commit<T>(&self, backup: Tables, outcome: T) -> Result<T> {
        match self.persist().await {
            Ok(()) => Ok(outcome),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "persisting record store failed; mutation rolled back"
                );
                self.inner.restore(backup).await;
                Err(err)
            }
        }
    }
}

#[async_trait]
impl RecordStore for JsonStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let _guard = self.write_lock.lock().await;
        let backup = self.inner.dump().await;
        let row = self.inner.insert(table, row).await?;
        self.commit(backup, row).await
    }

    async fn update(&self, table: Table, id: Uuid, changes: Map<String, Value>) -> Result<Value> {
        let _guard = self.write_lock.lock().await;
        let backup = self.inner.dump().await;
        let row = self.inner.update(table, id, changes).await?;
        self.commit(backup, row).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let backup = self.inner.dump().await;
        self.inner.delete(table, id).await?;
        self.commit(backup, ()).await
    }

    async fn delete_where(&self, table: Table, query: &Query) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let backup = self.inner.dump().await;
        let removed = self.inner.delete_where(table, query).await?;
        if removed == 0 {
            return Ok(0);
        }
        self.commit(backup, removed).await
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` next to `path` and renames it into place.
async fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
