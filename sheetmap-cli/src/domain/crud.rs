//! Generic CRUD capability consumed by the import engine

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A name/value filter passed to `list` (e.g. `variants.ebootis_id` -> `"HW-1001-1"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub name: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for FilterOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Lightweight record reference returned by a `list` query
pub trait LookupSummary {
    fn id(&self) -> &str;
}

/// Backing store for one record kind.
///
/// `T` is the full record, `L` the lookup summary. The import engine only
/// relies on `list` returning zero or more candidates for a filter and on
/// `read`/`update` round-tripping a full record by id.
#[async_trait]
pub trait CrudService<T, L>: Send + Sync
where
    T: Send + Sync + 'static,
    L: Send + 'static,
{
    /// List lookup summaries matching all filters
    async fn list(&self, filters: &[FilterOption]) -> Result<Vec<L>>;

    /// Read the full record with the given id
    async fn read(&self, id: &str) -> Result<T>;

    /// Replace the record with the given id, returning the stored version
    async fn update(&self, id: &str, record: &T) -> Result<T>;
}

/// A record that can live in the file-backed store (`crate::store::JsonStore`)
pub trait StoredRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Lookup: LookupSummary + Send + 'static;

    fn id(&self) -> &str;

    /// Whether this record satisfies a single list filter.
    /// Unknown filter names and empty values never match.
    fn matches(&self, filter: &FilterOption) -> bool;

    fn to_lookup(&self) -> Self::Lookup;

    /// Stamp the last modification time
    fn touch(&mut self, at: DateTime<Utc>);
}
