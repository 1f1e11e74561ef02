//! Hardware records and their variants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crud::{FilterOption, LookupSummary, StoredRecord};
use super::option::OptionEntry;

/// Summary returned when listing hardware
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareLookup {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manufacturer: String,
}

impl LookupSummary for HardwareLookup {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Full hardware record; one record groups several sellable variants
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareRecord {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub wkz: Vec<OptionEntry>,
    pub variants: Vec<VariantRecord>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A concrete variant (color/storage combination) of a hardware record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariantRecord {
    pub ebootis_id: String,
    pub external_article_number: String,
    pub ean: String,
    pub storage: i64,
    pub price: f64,
    pub color_name: String,
    pub default: bool,
}

impl HardwareRecord {
    /// Variant addressed by its ebootis id
    pub fn variant_mut(&mut self, ebootis_id: &str) -> Option<&mut VariantRecord> {
        self.variants.iter_mut().find(|v| v.ebootis_id == ebootis_id)
    }

    /// Variant addressed by its external article number
    pub fn variant_by_article_no_mut(&mut self, article_no: &str) -> Option<&mut VariantRecord> {
        self.variants
            .iter_mut()
            .find(|v| v.external_article_number == article_no)
    }

    pub fn as_lookup(&self) -> HardwareLookup {
        HardwareLookup {
            id: self.id.clone(),
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
        }
    }
}

impl StoredRecord for HardwareRecord {
    type Lookup = HardwareLookup;

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, filter: &FilterOption) -> bool {
        let value = filter.value.as_str();
        if value.is_empty() {
            return false;
        }
        match filter.name.as_str() {
            "id" => self.id == value,
            "variants.ebootis_id" => self.variants.iter().any(|v| v.ebootis_id == value),
            "variants.external_articlenumber" => self
                .variants
                .iter()
                .any(|v| v.external_article_number == value),
            _ => false,
        }
    }

    fn to_lookup(&self) -> HardwareLookup {
        self.as_lookup()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> HardwareRecord {
        HardwareRecord {
            id: "hw-1".into(),
            name: "Galaxy S24".into(),
            manufacturer: "Samsung".into(),
            variants: vec![
                VariantRecord {
                    ebootis_id: "HW-1-1".into(),
                    external_article_number: "A-100".into(),
                    ..Default::default()
                },
                VariantRecord {
                    ebootis_id: "HW-1-2".into(),
                    external_article_number: "A-200".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_variant_lookup() {
        let mut hw = phone();
        assert!(hw.variant_mut("HW-1-2").is_some());
        assert!(hw.variant_mut("HW-9-9").is_none());
        assert_eq!(
            hw.variant_by_article_no_mut("A-100").map(|v| v.ebootis_id.clone()),
            Some("HW-1-1".to_string())
        );
    }

    #[test]
    fn test_matches_variant_filters() {
        let hw = phone();
        assert!(hw.matches(&FilterOption::new("variants.ebootis_id", "HW-1-1")));
        assert!(hw.matches(&FilterOption::new("variants.external_articlenumber", "A-200")));
        assert!(!hw.matches(&FilterOption::new("variants.external_articlenumber", "HW-1-1")));
    }

    #[test]
    fn test_empty_value_never_matches() {
        let mut hw = phone();
        hw.variants.push(VariantRecord {
            ebootis_id: "HW-1-3".into(),
            ..Default::default()
        });
        assert!(!hw.matches(&FilterOption::new("variants.external_articlenumber", "")));
        assert!(!hw.matches(&FilterOption::new("variants.ebootis_id", "")));
    }
}
