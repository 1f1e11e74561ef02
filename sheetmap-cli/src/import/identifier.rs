//! Identifier column resolution
//!
//! A row addresses its record either by ebootis id (primary) or by external
//! article number (secondary). When both are mapped the primary one wins,
//! wherever it appears in the mapping.

use serde::{Deserialize, Serialize};

use super::MappingEntry;

/// Field key of the primary identifier
pub const EBOOTIS_ID: &str = "ebootisId";
/// Field key of the secondary identifier
pub const EXTERNAL_ARTICLE_NUMBER: &str = "externalArticleNumber";

/// The two supported ways to address a record from a spreadsheet row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    #[serde(rename = "ebootisId")]
    EbootisId,
    #[serde(rename = "externalArticleNumber")]
    ExternalArticleNumber,
}

impl IdentifierKind {
    /// Field key as used in mapping instructions
    pub fn field_key(&self) -> &'static str {
        match self {
            IdentifierKind::EbootisId => EBOOTIS_ID,
            IdentifierKind::ExternalArticleNumber => EXTERNAL_ARTICLE_NUMBER,
        }
    }

    /// Human readable name for messages
    pub fn label(&self) -> &'static str {
        match self {
            IdentifierKind::EbootisId => "ebootis id",
            IdentifierKind::ExternalArticleNumber => "external article number",
        }
    }

    pub fn from_field_key(key: &str) -> Option<Self> {
        match key {
            EBOOTIS_ID => Some(IdentifierKind::EbootisId),
            EXTERNAL_ARTICLE_NUMBER => Some(IdentifierKind::ExternalArticleNumber),
            _ => None,
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field_key())
    }
}

/// Column that carries the record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierColumn {
    /// 0-based spreadsheet column
    pub column_index: u32,
    pub kind: IdentifierKind,
}

impl IdentifierColumn {
    /// Flatten a resolution into `(found, column_index, kind)`; not found is `(false, 0, "")`
    pub fn unpack(resolved: Option<IdentifierColumn>) -> (bool, u32, &'static str) {
        match resolved {
            Some(col) => (true, col.column_index, col.kind.field_key()),
            None => (false, 0, ""),
        }
    }
}

/// Find the identifier column of a mapping.
///
/// An ebootis id entry returns immediately. External article number entries
/// are remembered while scanning continues, so the last one wins if no
/// ebootis id is mapped at all.
pub fn resolve_identifier(mapping: &[MappingEntry]) -> Option<IdentifierColumn> {
    let mut secondary = None;

    for entry in mapping {
        match IdentifierKind::from_field_key(&entry.field_key) {
            Some(IdentifierKind::EbootisId) => {
                return Some(IdentifierColumn {
                    column_index: entry.column_index,
                    kind: IdentifierKind::EbootisId,
                });
            }
            Some(IdentifierKind::ExternalArticleNumber) => {
                secondary = Some(IdentifierColumn {
                    column_index: entry.column_index,
                    kind: IdentifierKind::ExternalArticleNumber,
                });
            }
            None => {}
        }
    }

    secondary
}
