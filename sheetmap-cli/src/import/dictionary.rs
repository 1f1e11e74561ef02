//! Upload types and their field dictionaries
//!
//! The dictionaries drive the column dropdown of the mapping UI and decide
//! which field keys of a mapping instruction mean anything. They are built
//! once at startup and never mutated afterwards.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::error::ImportError;
use super::identifier::IdentifierKind;

/// Kind of record an upload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    Tariff,
    Hardware,
    Stocks,
}

impl UploadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadType::Tariff => "tariff",
            UploadType::Hardware => "hardware",
            UploadType::Stocks => "stocks",
        }
    }

    pub fn all_variants() -> &'static [UploadType] {
        &[UploadType::Tariff, UploadType::Hardware, UploadType::Stocks]
    }

    /// Name of the list filter that finds records of this type by identifier.
    /// `None` if the identifier kind cannot address this record type.
    pub fn identifier_filter(&self, kind: IdentifierKind) -> Option<&'static str> {
        match (self, kind) {
            (UploadType::Tariff, IdentifierKind::EbootisId) => Some("ebootis_id"),
            (UploadType::Tariff, IdentifierKind::ExternalArticleNumber) => None,
            (UploadType::Hardware, IdentifierKind::EbootisId) => Some("variants.ebootis_id"),
            (UploadType::Hardware, IdentifierKind::ExternalArticleNumber) => {
                Some("variants.external_articlenumber")
            }
            (UploadType::Stocks, IdentifierKind::EbootisId) => Some("ebootis_id"),
            (UploadType::Stocks, IdentifierKind::ExternalArticleNumber) => {
                Some("external_article_number")
            }
        }
    }

    fn builtin_fields(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            UploadType::Tariff => TARIFF_FIELDS,
            UploadType::Hardware => HARDWARE_FIELDS,
            UploadType::Stocks => STOCK_FIELDS,
        }
    }
}

impl FromStr for UploadType {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tariff" => Ok(UploadType::Tariff),
            "hardware" => Ok(UploadType::Hardware),
            "stocks" => Ok(UploadType::Stocks),
            other => Err(ImportError::UnknownUploadType {
                upload_type: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for UploadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const TARIFF_FIELDS: &[(&str, &str)] = &[
    ("ebootisId", "EbootisId"),
    ("basicCharge", "Monthly price"),
    ("basicChargeRenewal", "Monthly price after promotion period"),
    ("leadType", "Lead type"),
    ("provision", "Market premium"),
    ("xProvision", "Online premium"),
    ("connectionFee", "Connection fee (without EUR sign)"),
    ("dataVolume", "Included data volume in GB"),
    ("legalNote", "Legal note"),
    ("pibLink", "PIB URL"),
    ("highlight1", "Highlight 1"),
    ("highlight2", "Highlight 2"),
    ("highlight3", "Highlight 3"),
    ("highlight4", "Highlight 4"),
    ("highlight5", "Highlight 5"),
    ("bullet1", "Inclusive benefit 1"),
    ("bullet2", "Inclusive benefit 2"),
    ("bullet3", "Inclusive benefit 3"),
    ("bullet4", "Inclusive benefit 4"),
    ("bullet5", "Inclusive benefit 5"),
    ("bullet6", "Inclusive benefit 6"),
    ("supplierWkz", "Supplier WKZ"),
    ("tariffWkz", "Tariff WKZ"),
];

const HARDWARE_FIELDS: &[(&str, &str)] = &[
    ("ebootisId", "EbootisId"),
    ("externalArticleNumber", "External article no."),
    ("price", "Purchase price"),
    ("manufactWkz", "Manufacturer WKZ"),
    ("ek24Wkz", "ek24 WKZ"),
];

const STOCK_FIELDS: &[(&str, &str)] = &[
    ("ebootisId", "EbootisId"),
    ("externalArticleNumber", "External article no."),
    ("currentStock", "Current stock"),
    ("originalStock", "Original stock"),
];

/// Field key -> label table of one upload type, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDictionary {
    entries: Vec<(String, String)>,
}

impl FieldDictionary {
    fn from_static(fields: &[(&str, &str)]) -> Self {
        Self {
            entries: fields
                .iter()
                .map(|(key, label)| (key.to_string(), label.to_string()))
                .collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, label)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, l)| (k.as_str(), l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.iter().cloned().collect()
    }
}

/// Dictionaries of all upload types
#[derive(Debug, Clone)]
pub struct FieldDictionaries {
    tables: HashMap<UploadType, FieldDictionary>,
}

impl FieldDictionaries {
    /// Built-in labels
    pub fn builtin() -> Self {
        let tables = UploadType::all_variants()
            .iter()
            .map(|t| (*t, FieldDictionary::from_static(t.builtin_fields())))
            .collect();
        Self { tables }
    }

    /// Apply label overrides (`upload type -> field key -> label`).
    ///
    /// Overrides can only relabel existing keys; unknown upload types or
    /// field keys are configuration errors.
    pub fn with_overrides(
        mut self,
        overrides: &HashMap<String, HashMap<String, String>>,
    ) -> Result<Self> {
        for (type_name, labels) in overrides {
            let upload_type = match type_name.parse::<UploadType>() {
                Ok(t) => t,
                Err(_) => bail!("Label override for unknown upload type '{}'", type_name),
            };
            let Some(table) = self.tables.get_mut(&upload_type) else {
                bail!("No field dictionary for upload type '{}'", upload_type);
            };

            for (key, label) in labels {
                match table.entries.iter_mut().find(|(k, _)| k == key) {
                    Some(entry) => entry.1 = label.clone(),
                    None => bail!(
                        "Label override for unknown field '{}' of upload type '{}'",
                        key,
                        upload_type
                    ),
                }
            }
        }
        Ok(self)
    }

    pub fn get(&self, upload_type: UploadType) -> &FieldDictionary {
        // builtin() fills every variant
        &self.tables[&upload_type]
    }

    /// Dictionary for an upload type given by name
    pub fn dictionary_for(&self, upload_type: &str) -> Result<&FieldDictionary, ImportError> {
        let upload_type: UploadType = upload_type.parse()?;
        Ok(self.get(upload_type))
    }
}

impl Default for FieldDictionaries {
    fn default() -> Self {
        Self::builtin()
    }
}
