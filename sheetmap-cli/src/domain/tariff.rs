//! Tariff records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crud::{FilterOption, LookupSummary, StoredRecord};
use super::option::{OptionEntry, PricingInterval};

/// Summary returned when listing tariffs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffLookup {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ebootis_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl LookupSummary for TariffLookup {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Full tariff record as read from and written to the backing store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TariffRecord {
    pub id: String,
    pub name: String,
    pub ebootis_id: String,
    pub lead_type: i64,
    // payment
    pub basic_charge: f64,
    pub basic_charge_renewal: f64,
    pub connection_fee: f64,
    pub provision: f64,
    pub x_provision: f64,
    // description
    pub data_volume: f64,
    pub legal_note: String,
    pub pib_link: String,
    pub highlights: Vec<String>,
    // relations
    pub bullets: Vec<OptionEntry>,
    pub wkz: Vec<OptionEntry>,
    pub pricing_intervals: Vec<PricingInterval>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TariffRecord {
    pub fn as_lookup(&self) -> TariffLookup {
        TariffLookup {
            id: self.id.clone(),
            ebootis_id: self.ebootis_id.clone(),
            name: self.name.clone(),
        }
    }
}

impl StoredRecord for TariffRecord {
    type Lookup = TariffLookup;

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
            _ => false,
        }
    }

    fn to_lookup(&self) -> TariffLookup {
        self.as_lookup()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
