//! Stock level records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crud::{FilterOption, LookupSummary, StoredRecord};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLookup {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ebootis_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub external_article_number: String,
}

impl LookupSummary for StockLookup {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Stock level of a single article
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockRecord {
    pub id: String,
    pub ebootis_id: String,
    pub external_article_number: String,
    pub current_stock: i64,
    pub original_stock: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredRecord for StockRecord {
    type Lookup = StockLookup;

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, filter: &FilterOption) -> bool {
        if filter.value.is_empty() {
            return false;
        }
        match filter.name.as_str() {
            "id" => self.id == filter.value,
            "ebootis_id" => self.ebootis_id == filter.value,
            "external_article_number" => self.external_article_number == filter.value,
            _ => false,
        }
    }

    fn to_lookup(&self) -> StockLookup {
        StockLookup {
            id: self.id.clone(),
            ebootis_id: self.ebootis_id.clone(),
            external_article_number: self.external_article_number.clone(),
        }
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
