//! Row by row reconciliation of a staged upload against stored records
//!
//! Every data row names a record identifier. Matching records are read once
//! per pass and kept as pending edits, so later rows see the mutations of
//! earlier rows. All pending edits without errors are written back once the
//! last row has been visited.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{CrudService, FilterOption, LookupSummary};

use super::MappingEntry;
use super::MappingResult;
use super::apply::{MappedCell, RowContext, RowTarget};
use super::error::ImportError;
use super::identifier::IdentifierColumn;
use super::sheet::{SheetError, StagedSheet, cell_name};
use super::transform::NumberPolicy;

/// A record loaded during the current pass
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit<T> {
    pub record: T,
    /// Set once any row failed on this record; it is never persisted then
    pub has_error: bool,
}

/// Pending edits keyed by record id, remembering first-touch order
#[derive(Debug)]
pub struct PendingEdits<T> {
    order: Vec<String>,
    edits: HashMap<String, PendingEdit<T>>,
}

impl<T> Default for PendingEdits<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            edits: HashMap::new(),
        }
    }
}

impl<T> PendingEdits<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edits.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PendingEdit<T>> {
        self.edits.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PendingEdit<T>> {
        self.edits.get_mut(id)
    }

    /// Cache a freshly read record; an existing edit is kept
    pub fn insert(&mut self, id: &str, record: T) {
        if !self.edits.contains_key(id) {
            self.order.push(id.to_string());
            self.edits.insert(
                id.to_string(),
                PendingEdit {
                    record,
                    has_error: false,
                },
            );
        }
    }

    pub fn mark_error(&mut self, id: &str) {
        if let Some(edit) = self.edits.get_mut(id) {
            edit.has_error = true;
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drain in first-touched order
    pub fn into_ordered(mut self) -> Vec<(String, PendingEdit<T>)> {
        self.order
            .into_iter()
            .filter_map(|id| self.edits.remove(&id).map(|edit| (id, edit)))
            .collect()
    }
}

/// What a pass needs besides the sheet and the records
#[derive(Debug, Clone, Copy)]
pub struct ReconcilePlan<'a> {
    pub identifier: IdentifierColumn,
    /// List filter name for the identifier kind of this upload type
    pub filter: &'a str,
    pub mapping: &'a [MappingEntry],
    pub policy: NumberPolicy,
}

/// Open a staged workbook and reconcile its first worksheet
pub async fn reconcile<T, L>(
    crud: &dyn CrudService<T, L>,
    path: &Path,
    plan: ReconcilePlan<'_>,
) -> Result<MappingResult, ImportError>
where
    T: RowTarget,
    L: LookupSummary + Send + 'static,
{
    let sheet = StagedSheet::open(path).map_err(open_error)?;

    Ok(reconcile_sheet(crud, &sheet, plan).await)
}

fn open_error(e: SheetError) -> ImportError {
    match e {
        SheetError::NoWorksheets => ImportError::NoWorksheets,
        other => ImportError::Open {
            detail: other.to_string(),
        },
    }
}

/// Visit data rows 2..=last in order, then persist pending edits
pub async fn reconcile_sheet<T, L>(
    crud: &dyn CrudService<T, L>,
    sheet: &StagedSheet,
    plan: ReconcilePlan<'_>,
) -> MappingResult
where
    T: RowTarget,
    L: LookupSummary + Send + 'static,
{
    let mut result = MappingResult::default();
    let mut pending = PendingEdits::new();

    if let Some(last_row) = sheet.last_row() {
        for index in 1..=last_row {
            if sheet.row_cells(index).is_empty() {
                continue;
            }
            let row = index + 1;
            match reconcile_row(crud, sheet, &mut pending, row, &plan).await {
                Ok(()) => result.record_success(),
                Err(e) => {
                    log::warn!("Row {}: {}", row, e);
                    result.record_failure(&e);
                }
            }
        }
    }

    log::info!(
        "Visited {} rows of '{}' ({} ok, {} failed), saving {} records",
        result.rows_visited(),
        sheet.name(),
        result.successful_rows,
        result.unsuccessful_rows,
        pending.len()
    );

    for (id, edit) in pending.into_ordered() {
        if edit.has_error {
            log::debug!("Not saving record {} because a row failed on it", id);
            continue;
        }
        match crud.update(&id, &edit.record).await {
            Ok(_) => log::debug!("Saved record {}", id),
            Err(e) => {
                log::error!("Failed to update record {}: {:#}", id, e);
                result.push_failure(&ImportError::Persistence { id });
            }
        }
    }

    result
}

async fn reconcile_row<T, L>(
    crud: &dyn CrudService<T, L>,
    sheet: &StagedSheet,
    pending: &mut PendingEdits<T>,
    row: u32,
    plan: &ReconcilePlan<'_>,
) -> Result<(), ImportError>
where
    T: RowTarget,
    L: LookupSummary + Send + 'static,
{
    let id_cell = cell_name(plan.identifier.column_index.saturating_add(1), row)?;
    let identifier = sheet.cell_value(&id_cell)?;
    if identifier.trim().is_empty() {
        return Err(ImportError::EmptyIdentifier { row, cell: id_cell });
    }

    let lookup_error = || ImportError::Lookup {
        row,
        identifier: identifier.clone(),
    };

    let filter = FilterOption::new(plan.filter, identifier.as_str());
    let matches = crud.list(std::slice::from_ref(&filter)).await.map_err(|e| {
        log::error!("Listing records by {} failed: {:#}", filter, e);
        lookup_error()
    })?;

    let mut ids: Vec<String> = Vec::with_capacity(matches.len());
    for found in &matches {
        if !ids.iter().any(|id| id == found.id()) {
            ids.push(found.id().to_string());
        }
    }
    if ids.is_empty() {
        log::info!("Row {}: no record matches {}", row, filter);
        return Ok(());
    }

    for id in &ids {
        if pending.contains(id) {
            continue;
        }
        let record = crud.read(id).await.map_err(|e| {
            log::error!("Reading record {} failed: {:#}", id, e);
            lookup_error()
        })?;
        pending.insert(id, record);
    }

    let cells = match read_mapped_cells(sheet, row, plan.mapping) {
        Ok(cells) => cells,
        Err(e) => {
            for id in &ids {
                pending.mark_error(id);
            }
            return Err(e);
        }
    };

    let ctx = RowContext {
        row,
        identifier: plan.identifier.kind,
        identifier_value: &identifier,
        cells: &cells,
        policy: plan.policy,
    };

    let mut row_error = None;
    for id in &ids {
        let Some(edit) = pending.get_mut(id) else {
            continue;
        };
        if edit.has_error {
            row_error.get_or_insert(ImportError::RecordSkipped {
                row,
                id: id.clone(),
            });
            continue;
        }
        if let Err(e) = edit.record.apply_row(&ctx) {
            log::debug!("Row {}: record {} rejected: {}", row, edit.record.record_id(), e);
            edit.has_error = true;
            row_error.get_or_insert(e);
        }
    }

    match row_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn read_mapped_cells(
    sheet: &StagedSheet,
    row: u32,
    mapping: &[MappingEntry],
) -> Result<Vec<MappedCell>, ImportError> {
    mapping
        .iter()
        .map(|entry| {
            let cell = cell_name(entry.column_index.saturating_add(1), row)?;
            let value = sheet.cell_value(&cell)?;
            Ok(MappedCell {
                cell,
                field_key: entry.field_key.clone(),
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StockLookup, StockRecord};
    use crate::import::identifier::IdentifierKind;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use rust_xlsxwriter::Workbook;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Stocks {
        records: Mutex<Vec<StockRecord>>,
        fail_update: Option<String>,
        lists: AtomicUsize,
    }

    #[async_trait]
    impl CrudService<StockRecord, StockLookup> for Stocks {
        async fn list(&self, filters: &[FilterOption]) -> Result<Vec<StockLookup>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| filters.iter().all(|f| r.ebootis_id == f.value))
                .map(|r| StockLookup {
                    id: r.id.clone(),
                    ..Default::default()
                })
                .collect())
        }

        async fn read(&self, id: &str) -> Result<StockRecord> {
            let records = self.records.lock().unwrap();
            records
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("no record {}", id))
        }

        async fn update(&self, id: &str, record: &StockRecord) -> Result<StockRecord> {
            if self.fail_update.as_deref() == Some(id) {
                return Err(anyhow!("disk full"));
            }
            let mut records = self.records.lock().unwrap();
            let slot = records.iter_mut().find(|r| r.id == id).unwrap();
            *slot = record.clone();
            Ok(record.clone())
        }
    }

    fn stock(id: &str, ebootis_id: &str) -> StockRecord {
        StockRecord {
            id: id.into(),
            ebootis_id: ebootis_id.into(),
            ..Default::default()
        }
    }

    fn sheet(dir: &TempDir, rows: &[&[&str]]) -> StagedSheet {
        let path = dir.path().join("data.xlsx");
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    ws.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save(&path).unwrap();
        StagedSheet::open(&path).unwrap()
    }

    fn plan(mapping: &[MappingEntry]) -> ReconcilePlan<'_> {
        ReconcilePlan {
            identifier: IdentifierColumn {
                column_index: 0,
                kind: IdentifierKind::EbootisId,
            },
            filter: "ebootis_id",
            mapping,
            policy: NumberPolicy::Strict,
        }
    }

    #[test]
    fn test_pending_edits_keep_first_touch_order() {
        let mut pending = PendingEdits::new();
        pending.insert("b", 1);
        pending.insert("a", 2);
        pending.insert("b", 99);
        pending.mark_error("a");

        assert_eq!(pending.len(), 2);
        assert_eq!(pending.get("b").unwrap().record, 1);

        let drained = pending.into_ordered();
        assert_eq!(drained[0].0, "b");
        assert_eq!(drained[1].0, "a");
        assert!(drained[1].1.has_error);
    }

    #[tokio::test]
    async fn test_rows_update_stock_levels() {
        let tmp = TempDir::new().unwrap();
        let sheet = sheet(
            &tmp,
            &[
                &["Id", "Stock"],
                &["S-1", "4"],
                &[],
                &["S-2", "7"],
                &["S-unknown", "1"],
            ],
        );
        let crud = Stocks {
            records: Mutex::new(vec![stock("1", "S-1"), stock("2", "S-2")]),
            ..Default::default()
        };
        let mapping = vec![
            MappingEntry::new(0, "ebootisId"),
            MappingEntry::new(1, "currentStock"),
        ];

        let result =
            reconcile_sheet::<StockRecord, StockLookup>(&crud, &sheet, plan(&mapping)).await;

        assert_eq!(result.successful_rows, 3);
        assert_eq!(result.unsuccessful_rows, 0);
        assert!(result.failed_rows.is_empty());
        let records = crud.records.lock().unwrap();
        assert_eq!(records[0].current_stock, 4);
        assert_eq!(records[1].current_stock, 7);
    }

    #[tokio::test]
    async fn test_failed_record_is_skipped_and_not_saved() {
        let tmp = TempDir::new().unwrap();
        let sheet = sheet(
            &tmp,
            &[&["Id", "Stock"], &["S-1", "lots"], &["S-1", "5"]],
        );
        let crud = Stocks {
            records: Mutex::new(vec![stock("1", "S-1")]),
            ..Default::default()
        };
        let mapping = vec![
            MappingEntry::new(0, "ebootisId"),
            MappingEntry::new(1, "currentStock"),
        ];

        let result =
            reconcile_sheet::<StockRecord, StockLookup>(&crud, &sheet, plan(&mapping)).await;

        assert_eq!(result.successful_rows, 0);
        assert_eq!(result.unsuccessful_rows, 2);
        assert_eq!(result.failed_rows[0].title, "Number format error");
        assert_eq!(result.failed_rows[1].title, "Record skipped");
        assert_eq!(crud.records.lock().unwrap()[0].current_stock, 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_change_counts() {
        let tmp = TempDir::new().unwrap();
        let sheet = sheet(&tmp, &[&["Id", "Stock"], &["S-1", "1"], &["S-2", "2"]]);
        let crud = Stocks {
            records: Mutex::new(vec![stock("1", "S-1"), stock("2", "S-2")]),
            fail_update: Some("1".into()),
            ..Default::default()
        };
        let mapping = vec![
            MappingEntry::new(0, "ebootisId"),
            MappingEntry::new(1, "currentStock"),
        ];

        let result =
            reconcile_sheet::<StockRecord, StockLookup>(&crud, &sheet, plan(&mapping)).await;

        assert_eq!(result.successful_rows, 2);
        assert_eq!(result.unsuccessful_rows, 0);
        assert_eq!(
            result.failed_rows,
            vec![ImportError::Persistence { id: "1".into() }.to_failure()]
        );
        assert_eq!(crud.records.lock().unwrap()[1].current_stock, 2);
    }

    #[tokio::test]
    async fn test_out_of_range_column_is_row_failure() {
        let tmp = TempDir::new().unwrap();
        let sheet = sheet(&tmp, &[&["Id"], &["S-1"]]);
        let crud = Stocks {
            records: Mutex::new(vec![stock("1", "S-1")]),
            ..Default::default()
        };
        let mapping = vec![
            MappingEntry::new(0, "ebootisId"),
            MappingEntry::new(20_000, "currentStock"),
        ];

        let result =
            reconcile_sheet::<StockRecord, StockLookup>(&crud, &sheet, plan(&mapping)).await;

        assert_eq!(result.unsuccessful_rows, 1);
        assert_eq!(result.failed_rows[0].title, "Coordinate error");
    }

    #[tokio::test]
    async fn test_blank_identifier_is_row_failure() {
        let tmp = TempDir::new().unwrap();
        let sheet = sheet(&tmp, &[&["Id", "Stock"], &["", "5"], &["S-1", "3"]]);
        let crud = Stocks {
            records: Mutex::new(vec![stock("1", ""), stock("2", "S-1")]),
            ..Default::default()
        };
        let mapping = vec![
            MappingEntry::new(0, "ebootisId"),
            MappingEntry::new(1, "currentStock"),
        ];

        let result =
            reconcile_sheet::<StockRecord, StockLookup>(&crud, &sheet, plan(&mapping)).await;

        assert_eq!(result.successful_rows, 1);
        assert_eq!(result.unsuccessful_rows, 1);
        assert_eq!(
            result.failed_rows,
            vec![
                ImportError::EmptyIdentifier {
                    row: 2,
                    cell: "A2".into()
                }
                .to_failure()
            ]
        );
        assert_eq!(crud.lists.load(Ordering::SeqCst), 1);
        let records = crud.records.lock().unwrap();
        assert_eq!(records[0].current_stock, 0);
        assert_eq!(records[1].current_stock, 3);
    }

    #[tokio::test]
    async fn test_out_of_range_identifier_column_is_row_failure() {
        let tmp = TempDir::new().unwrap();
        let sheet = sheet(&tmp, &[&["Id", "Stock"], &["S-1", "5"]]);
        let crud = Stocks {
            records: Mutex::new(vec![stock("1", "S-1")]),
            ..Default::default()
        };
        let mapping = vec![
            MappingEntry::new(20_000, "ebootisId"),
            MappingEntry::new(1, "currentStock"),
        ];
        let plan = ReconcilePlan {
            identifier: IdentifierColumn {
                column_index: 20_000,
                kind: IdentifierKind::EbootisId,
            },
            ..plan(&mapping)
        };

        let result = reconcile_sheet::<StockRecord, StockLookup>(&crud, &sheet, plan).await;

        assert_eq!(result.successful_rows, 0);
        assert_eq!(result.unsuccessful_rows, 1);
        assert_eq!(result.failed_rows[0].title, "Coordinate error");
        assert_eq!(crud.lists.load(Ordering::SeqCst), 0);
        assert_eq!(crud.records.lock().unwrap()[0].current_stock, 0);
    }

    #[test]
    fn test_open_errors_map_to_import_errors() {
        assert_eq!(open_error(SheetError::NoWorksheets), ImportError::NoWorksheets);
        assert!(matches!(
            open_error(SheetError::Open("missing".into())),
            ImportError::Open { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_staged_file_is_open_error() {
        let tmp = TempDir::new().unwrap();
        let crud = Stocks::default();
        let mapping = vec![MappingEntry::new(0, "ebootisId")];

        let result = reconcile::<StockRecord, StockLookup>(
            &crud,
            &tmp.path().join("gone.xlsx"),
            plan(&mapping),
        )
        .await;

        assert!(matches!(result, Err(ImportError::Open { .. })));
    }
}
