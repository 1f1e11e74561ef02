//! Shared value types embedded in product records

use serde::{Deserialize, Serialize};

/// Ordered key/value option (bullets, WKZ entries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub key: String,
    pub value: String,
}

impl OptionEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Price that applies for a range of contract months
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInterval {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ebootis_id: String,
    pub month_interval: i64,
    pub start_month: i64,
    pub end_month: i64,
    pub price: f64,
}
