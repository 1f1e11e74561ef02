//! Write a MappingResult to Excel format

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use super::MappingResult;

mod sheets {
    pub const SUMMARY: &str = "Summary";
    pub const FAILURES: &str = "Failures";
}

/// Write row counts and all failures of a reconciliation pass to an Excel file
pub fn write_result_excel(result: &MappingResult, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let summary = workbook.add_worksheet();
    summary.set_name(sheets::SUMMARY)?;
    summary.write_string_with_format(0, 0, "Successful rows", &bold)?;
    summary.write_number(0, 1, result.successful_rows as f64)?;
    summary.write_string_with_format(1, 0, "Unsuccessful rows", &bold)?;
    summary.write_number(1, 1, result.unsuccessful_rows as f64)?;
    summary.write_string_with_format(2, 0, "Failures", &bold)?;
    summary.write_number(2, 1, result.failed_rows.len() as f64)?;
    summary.set_column_width(0, 22)?;

    let failures = workbook.add_worksheet();
    failures.set_name(sheets::FAILURES)?;
    failures.write_string_with_format(0, 0, "Title", &bold)?;
    failures.write_string_with_format(0, 1, "Message", &bold)?;
    for (idx, failure) in result.failed_rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        failures.write_string(row, 0, &failure.title)?;
        failures.write_string(row, 1, &failure.message)?;
    }
    failures.set_column_width(0, 40)?;
    failures.set_column_width(1, 100)?;

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    log::info!(
        "Wrote import report with {} failures to {}",
        result.failed_rows.len(),
        path.display()
    );
    Ok(())
}
