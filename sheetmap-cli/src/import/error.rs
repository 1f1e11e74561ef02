//! Error taxonomy for staging, preview and reconciliation
//!
//! Every error carries a short title and a longer message. Callers surface
//! both to the operator as they are.

use serde::{Deserialize, Serialize};

use super::identifier::IdentifierKind;

/// A failure recorded in a reconciliation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub title: String,
    pub message: String,
}

impl Failure {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Errors raised by the import engine.
///
/// Call-scoped kinds (directory, persist, parse, structural, unknown upload
/// type, missing identifier, open) abort the whole operation. Row-scoped kinds
/// (coordinate, cell read, empty identifier, lookup, variant, cell format,
/// skipped record) end up in `MappingResult::failed_rows`, as do persistence
/// failures of the final sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// Session directory could not be created or the session id is not a valid path segment
    Directory { session_id: String, reason: String },
    /// Uploaded content could not be written to the staging directory
    Persist { reason: String },
    /// Spreadsheet could not be opened or a row could not be read
    Parse { detail: String },
    /// Workbook contains no worksheets
    NoWorksheets,
    /// A preview row (1-based) has no cells
    EmptyRow { row: u32 },
    /// No field dictionary exists for the upload type
    UnknownUploadType { upload_type: String },
    /// No mapped column carries an identifier supported by the upload type
    MissingIdentifier,
    /// Staged file for a session is missing or corrupt
    Open { detail: String },
    /// Column/row (1-based) outside the addressable sheet area
    Coordinate { column: u32, row: u32 },
    /// Cell value could not be retrieved
    CellRead { cell: String },
    /// Identifier cell of a data row is blank
    EmptyIdentifier { row: u32, cell: String },
    /// CRUD list/read failed for a row identifier
    Lookup { row: u32, identifier: String },
    /// Record was flagged erroneous by an earlier row of the same pass
    RecordSkipped { row: u32, id: String },
    /// Hardware variant addressed by the row identifier does not exist
    VariantNotFound { kind: IdentifierKind, value: String },
    /// Numeric field received unparseable input under the strict number policy
    CellFormat { cell: String, value: String },
    /// CRUD update failed for a record
    Persistence { id: String },
}

impl ImportError {
    /// Short, user facing title
    pub fn title(&self) -> &'static str {
        match self {
            ImportError::Directory { .. } => "Directory error",
            ImportError::Persist { .. } => "Storage error",
            ImportError::Parse { .. } => "Parsing error",
            ImportError::NoWorksheets => "Invalid spreadsheet",
            ImportError::EmptyRow { .. } => "Empty row",
            ImportError::UnknownUploadType { .. } => "Missing or unknown upload type",
            ImportError::MissingIdentifier => "Missing ebootisId / external article number",
            ImportError::Open { .. } => "Error opening file",
            ImportError::Coordinate { .. } => "Coordinate error",
            ImportError::CellRead { .. } => "Cell read error",
            ImportError::EmptyIdentifier { .. } | ImportError::Lookup { .. } => {
                "Identification error"
            }
            ImportError::RecordSkipped { .. } => "Record skipped",
            ImportError::VariantNotFound { .. } => "Unknown variant",
            ImportError::CellFormat { .. } => "Number format error",
            ImportError::Persistence { .. } => "Save error",
        }
    }

    /// Longer description of what went wrong
    pub fn message(&self) -> String {
        match self {
            ImportError::Directory { session_id, reason } => format!(
                "The working directory for session '{}' could not be created: {}",
                session_id, reason
            ),
            ImportError::Persist { reason } => {
                format!("The uploaded file could not be saved: {}", reason)
            }
            ImportError::Parse { detail } => format!(
                "The spreadsheet could not be processed ({}). Check the file format.",
                detail
            ),
            ImportError::NoWorksheets => "The file does not contain any worksheets".to_string(),
            ImportError::EmptyRow { row: 1 } => "The first row of the file is empty. It must \
                contain the column headers for the import."
                .to_string(),
            ImportError::EmptyRow { row } => format!(
                "Row {} of the file is empty. The preview rows must not be empty.",
                row
            ),
            ImportError::UnknownUploadType { upload_type } => {
                format!("The upload type '{}' is unknown", upload_type)
            }
            ImportError::MissingIdentifier => "None of the columns was mapped to an ebootisId or \
                external article number supported by this upload type"
                .to_string(),
            ImportError::Open { detail } => format!(
                "The spreadsheet of this session could not be opened ({}). The session may have expired.",
                detail
            ),
            ImportError::Coordinate { column, row } => format!(
                "Row {}, column {} could not be converted to a cell name",
                row, column
            ),
            ImportError::CellRead { cell } => {
                format!("The content of cell {} could not be read", cell)
            }
            ImportError::EmptyIdentifier { row, cell } => format!(
                "Error in row {}. Cell {} holds no identifier",
                row, cell
            ),
            ImportError::Lookup { row, identifier } => format!(
                "Error in row {}. No records could be determined for identifier '{}'",
                row, identifier
            ),
            ImportError::RecordSkipped { row, id } => format!(
                "Row {} refers to record {}, which already failed earlier in this import and will not be saved",
                row, id
            ),
            ImportError::VariantNotFound { kind, value } => format!(
                "No variant with {} '{}' was found",
                kind.label(),
                value
            ),
            ImportError::CellFormat { cell, value } => {
                format!("Cell {} contains '{}', which is not a number", cell, value)
            }
            ImportError::Persistence { id } => format!("Record {} could not be updated", id),
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure::new(self.title(), self.message())
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}

impl std::error::Error for ImportError {}

impl From<ImportError> for Failure {
    fn from(err: ImportError) -> Self {
        err.to_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_combines_title_and_message() {
        let err = ImportError::UnknownUploadType {
            upload_type: "bananas".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing or unknown upload type: The upload type 'bananas' is unknown"
        );
    }

    #[test]
    fn test_header_row_has_dedicated_message() {
        let header = ImportError::EmptyRow { row: 1 }.message();
        let sample = ImportError::EmptyRow { row: 3 }.message();
        assert!(header.contains("column headers"));
        assert!(sample.starts_with("Row 3"));
    }

    #[test]
    fn test_to_failure() {
        let failure = ImportError::Persistence { id: "hw-1".into() }.to_failure();
        assert_eq!(failure.title, "Save error");
        assert_eq!(failure.message, "Record hw-1 could not be updated");
    }
}
