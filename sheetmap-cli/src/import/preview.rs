//! Header and sample rows of a staged upload

use std::path::Path;

use super::dictionary::FieldDictionary;
use super::error::ImportError;
use super::sheet::{SheetError, StagedSheet};

/// Header row plus this many sample rows
pub const PREVIEW_ROWS: u32 = 4;

/// Rows shown to the operator before mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub header_row: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
}

fn parse_error(e: SheetError) -> ImportError {
    match e {
        SheetError::NoWorksheets => ImportError::NoWorksheets,
        other => ImportError::Parse {
            detail: other.to_string(),
        },
    }
}

/// Read the header and up to three sample rows of the first worksheet.
///
/// A row without any cells is an error wherever it occurs in the preview
/// window, so a sheet without any cells fails on its header row.
pub fn preview(path: &Path) -> Result<Preview, ImportError> {
    let sheet = StagedSheet::open(path).map_err(parse_error)?;

    let Some(last_row) = sheet.last_row() else {
        log::debug!("Worksheet '{}' is empty", sheet.name());
        return Err(ImportError::EmptyRow { row: 1 });
    };

    let mut rows = Vec::new();
    for row in 0..PREVIEW_ROWS.min(last_row + 1) {
        let cells = sheet.row_cells(row);
        if cells.is_empty() {
            return Err(ImportError::EmptyRow { row: row + 1 });
        }
        rows.push(cells);
    }

    let mut rows = rows.into_iter();
    let header_row = rows.next().unwrap_or_default();
    let sample_rows: Vec<Vec<String>> = rows.collect();

    log::debug!(
        "Previewed worksheet '{}': {} columns, {} sample rows",
        sheet.name(),
        header_row.len(),
        sample_rows.len()
    );
    Ok(Preview {
        header_row,
        sample_rows,
    })
}

/// Preview against a resolved dictionary; convenience for callers that
/// already checked the upload type
pub fn preview_with(
    path: &Path,
    dictionary: &FieldDictionary,
    session_id: &str,
) -> Result<super::MappingOptions, ImportError> {
    let Preview {
        header_row,
        sample_rows,
    } = preview(path)?;

    Ok(super::MappingOptions {
        field_dictionary: dictionary.to_map(),
        header_row,
        sample_rows,
        session_id: session_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_rows(dir: &TempDir, rows: &[&[&str]]) -> std::path::PathBuf {
        let path = dir.path().join("data.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_header_and_samples() {
        let tmp = TempDir::new().unwrap();
        let path = write_rows(
            &tmp,
            &[
                &["EbootisId", "Stock", "Original"],
                &["S-1", "4", "10"],
                &["S-2", "0"],
                &["S-3", "1", "1"],
                &["S-4", "9", "9"],
            ],
        );

        let preview = preview(&path).unwrap();
        assert_eq!(preview.header_row, vec!["EbootisId", "Stock", "Original"]);
        assert_eq!(preview.sample_rows.len(), 3);
        assert_eq!(preview.sample_rows[1], vec!["S-2", "0"]);
    }

    #[test]
    fn test_empty_header_row() {
        let tmp = TempDir::new().unwrap();
        let path = write_rows(&tmp, &[&[], &["S-1", "4"]]);

        assert_eq!(preview(&path), Err(ImportError::EmptyRow { row: 1 }));
    }

    #[test]
    fn test_empty_sample_row() {
        let tmp = TempDir::new().unwrap();
        let path = write_rows(&tmp, &[&["Id", "Stock"], &[], &["S-1", "4"]]);

        assert_eq!(preview(&path), Err(ImportError::EmptyRow { row: 2 }));
    }

    #[test]
    fn test_blank_rows_after_window_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = write_rows(
            &tmp,
            &[&["Id"], &["a"], &["b"], &["c"], &[], &["after gap"]],
        );

        let preview = preview(&path).unwrap();
        assert_eq!(preview.sample_rows.len(), 3);
    }

    #[test]
    fn test_sheet_without_cells() {
        let tmp = TempDir::new().unwrap();
        let path = write_rows(&tmp, &[]);

        assert_eq!(preview(&path), Err(ImportError::EmptyRow { row: 1 }));
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.xlsx");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();

        assert!(matches!(preview(&path), Err(ImportError::Parse { .. })));
    }

    #[test]
    fn test_open_errors_map_to_import_errors() {
        assert_eq!(parse_error(SheetError::NoWorksheets), ImportError::NoWorksheets);
        assert_eq!(
            parse_error(SheetError::Range("bad range".into())),
            ImportError::Parse {
                detail: "failed to read worksheet: bad range".into()
            }
        );
    }
}
