//! Read access to the first worksheet of a staged workbook

use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx, open_workbook};

use super::error::ImportError;

/// Highest column Excel can address (XFD)
pub const MAX_COLUMNS: u32 = 16_384;
/// Highest row Excel can address
pub const MAX_ROWS: u32 = 1_048_576;

/// Why a staged workbook could not be turned into a sheet
#[derive(Debug, Clone, PartialEq)]
pub enum SheetError {
    /// Workbook file could not be opened or parsed
    Open(String),
    /// Workbook has no worksheets
    NoWorksheets,
    /// First worksheet could not be read
    Range(String),
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::Open(e) => write!(f, "failed to open workbook: {}", e),
            SheetError::NoWorksheets => write!(f, "workbook has no worksheets"),
            SheetError::Range(e) => write!(f, "failed to read worksheet: {}", e),
        }
    }
}

impl std::error::Error for SheetError {}

/// First worksheet of a workbook, loaded into memory
#[derive(Debug, Clone)]
pub struct StagedSheet {
    name: String,
    range: Range<Data>,
}

impl StagedSheet {
    /// Open a workbook and load its first worksheet
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        let mut workbook = open_workbook::<Xlsx<_>, _>(path)
            .map_err(|e| SheetError::Open(e.to_string()))?;

        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(SheetError::NoWorksheets)?;

        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| SheetError::Range(e.to_string()))?;

        log::debug!("Loaded worksheet '{}' from {}", name, path.display());
        Ok(Self { name, range })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 0-based index of the last row holding any cell, `None` for an empty sheet
    pub fn last_row(&self) -> Option<u32> {
        self.range.end().map(|(row, _)| row)
    }

    /// Cell strings of a 0-based row, trailing empty cells trimmed.
    /// An empty vector means the row has no cells at all.
    pub fn row_cells(&self, row: u32) -> Vec<String> {
        let Some((_, last_col)) = self.range.end() else {
            return Vec::new();
        };

        let mut cells: Vec<String> = (0..=last_col)
            .map(|col| {
                self.range
                    .get_value((row, col))
                    .map(cell_to_string)
                    .unwrap_or_default()
            })
            .collect();

        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        cells
    }

    /// Value of the cell at an A1-style address; missing cells read as ""
    pub fn cell_value(&self, cell: &str) -> Result<String, ImportError> {
        let (column, row) = parse_cell_name(cell).ok_or_else(|| ImportError::CellRead {
            cell: cell.to_string(),
        })?;

        Ok(self
            .range
            .get_value((row - 1, column - 1))
            .map(cell_to_string)
            .unwrap_or_default())
    }
}

/// Convert 1-based column and row numbers to a cell name, e.g. (3, 12) -> "C12"
pub fn cell_name(column: u32, row: u32) -> Result<String, ImportError> {
    if column < 1 || column > MAX_COLUMNS || row < 1 || row > MAX_ROWS {
        return Err(ImportError::Coordinate { column, row });
    }
    Ok(format!("{}{}", column_letters(column), row))
}

/// Column letters of a 1-based column number, e.g. 28 -> "AB"
fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Parse a cell name into 1-based (column, row)
pub fn parse_cell_name(cell: &str) -> Option<(u32, u32)> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut column: u32 = 0;
    for c in letters.chars() {
        let value = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        column = column.checked_mul(26)?.checked_add(value)?;
    }
    let row: u32 = digits.parse().ok()?;

    if column > MAX_COLUMNS || row < 1 || row > MAX_ROWS {
        return None;
    }
    Some((column, row))
}

/// Render a cell the way it reads in the spreadsheet UI
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Whole numbers without a trailing ".0"
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}
