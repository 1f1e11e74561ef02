//! JSON file backed record store
//!
//! Holds all records of one kind in memory and rewrites the backing file on
//! every update. Good enough for the CLI and for tests; the import engine
//! only sees the `CrudService` trait.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{CrudService, FilterOption, StoredRecord};

pub struct JsonStore<T> {
    path: Option<PathBuf>,
    records: RwLock<Vec<T>>,
}

impl<T: StoredRecord> JsonStore<T> {
    /// A store that is never written to disk
    pub fn in_memory(records: Vec<T>) -> Self {
        Self {
            path: None,
            records: RwLock::new(records),
        }
    }

    /// Load records from a JSON array file. A missing file is an empty store
    /// that gets created on the first update.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Vec<T> = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse records from {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No record file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read records from {}", path.display()));
            }
        };

        log::debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Snapshot of all records
    pub async fn records(&self) -> Vec<T> {
        self.records.read().await.clone()
    }

    async fn persist(&self, records: &[T]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write records to {}", path.display()))
    }
}

#[async_trait]
impl<T: StoredRecord> CrudService<T, T::Lookup> for JsonStore<T> {
    async fn list(&self, filters: &[FilterOption]) -> Result<Vec<T::Lookup>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| filters.iter().all(|f| r.matches(f)))
            .map(|r| r.to_lookup())
            .collect())
    }

    async fn read(&self, id: &str) -> Result<T> {
        let records = self.records.read().await;
        match records.iter().find(|r| r.id() == id) {
            Some(record) => Ok(record.clone()),
            None => bail!("Record '{}' not found", id),
        }
    }

    async fn update(&self, id: &str, record: &T) -> Result<T> {
        let mut records = self.records.write().await;
        let Some(idx) = records.iter().position(|r| r.id() == id) else {
            bail!("Record '{}' not found", id);
        };

        let mut stored = record.clone();
        stored.touch(Utc::now());
        let mut updated = records.clone();
        updated[idx] = stored.clone();
        self.persist(&updated).await?;
        *records = updated;

        Ok(stored)
    }
}
