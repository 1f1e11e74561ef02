//! Spreadsheet import engine
//!
//! An upload is staged under a session id and previewed so the operator can
//! map columns to record fields. The mapping instruction is then reconciled
//! row by row against the backing records.

pub mod apply;
pub mod dictionary;
pub mod error;
pub mod identifier;
pub mod preview;
pub mod reconcile;
pub mod report;
pub mod service;
pub mod sheet;
pub mod staging;
pub mod transform;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use dictionary::{FieldDictionaries, FieldDictionary, UploadType};
pub use error::{Failure, ImportError};
pub use identifier::{IdentifierColumn, IdentifierKind, resolve_identifier};
pub use service::{Backends, MappingService};
pub use staging::{StagedUpload, StagingStore};
pub use transform::NumberPolicy;

/// One column of a mapping instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    /// 0-based spreadsheet column
    pub column_index: u32,
    pub field_key: String,
}

impl MappingEntry {
    pub fn new(column_index: u32, field_key: impl Into<String>) -> Self {
        Self {
            column_index,
            field_key: field_key.into(),
        }
    }
}

/// Operator's answer to a preview: which column feeds which field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingInstruction {
    pub session_id: String,
    pub upload_type: String,
    pub mapping: Vec<MappingEntry>,
}

/// Preview of a staged upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingOptions {
    pub field_dictionary: BTreeMap<String, String>,
    pub header_row: Vec<String>,
    /// Up to three rows following the header
    pub sample_rows: Vec<Vec<String>>,
    pub session_id: String,
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    pub successful_rows: u32,
    pub unsuccessful_rows: u32,
    pub failed_rows: Vec<Failure>,
}

impl MappingResult {
    pub fn record_success(&mut self) {
        self.successful_rows += 1;
    }

    /// Count an unsuccessful row and keep its failure
    pub fn record_failure(&mut self, error: &ImportError) {
        self.unsuccessful_rows += 1;
        self.failed_rows.push(error.to_failure());
    }

    /// Keep a failure that is not tied to a row count
    pub fn push_failure(&mut self, error: &ImportError) {
        self.failed_rows.push(error.to_failure());
    }

    pub fn rows_visited(&self) -> u32 {
        self.successful_rows + self.unsuccessful_rows
    }
}

/// An incoming upload
#[derive(Debug)]
pub struct UploadData<R> {
    pub uploaded_file: R,
    pub upload_type: String,
    /// Reuse this session instead of creating a new one
    pub session_id: Option<String>,
}
