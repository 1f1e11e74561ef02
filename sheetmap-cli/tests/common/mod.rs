#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

use sheetmap::domain::{
    CrudService, FilterOption, HardwareRecord, StockRecord, StoredRecord, TariffRecord,
};
use sheetmap::import::{Backends, FieldDictionaries, MappingService, StagingStore};

/// Write rows of strings to the first worksheet of a new workbook
pub fn write_xlsx(path: &Path, rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Workbook bytes for the given rows
pub fn xlsx_bytes(rows: &[&[&str]]) -> Vec<u8> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("upload.xlsx");
    write_xlsx(&path, rows);
    std::fs::read(path).unwrap()
}

/// In-memory CRUD collaborator that counts calls
pub struct CountingCrud<T> {
    pub records: Mutex<Vec<T>>,
    pub lists: AtomicUsize,
    pub reads: AtomicUsize,
    pub updates: Mutex<Vec<T>>,
    pub fail_list: bool,
    pub fail_update_for: Option<String>,
}

impl<T: StoredRecord> CountingCrud<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
            lists: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
            fail_list: false,
            fail_update_for: None,
        }
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn updated(&self) -> Vec<T> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: StoredRecord> CrudService<T, T::Lookup> for CountingCrud<T> {
    async fn list(&self, filters: &[FilterOption]) -> Result<Vec<T::Lookup>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(anyhow!("backend unavailable"));
        }
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| filters.iter().all(|f| r.matches(f)))
            .map(|r| r.to_lookup())
            .collect())
    }

    async fn read(&self, id: &str) -> Result<T> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| anyhow!("record {} not found", id))
    }

    async fn update(&self, id: &str, record: &T) -> Result<T> {
        if self.fail_update_for.as_deref() == Some(id) {
            return Err(anyhow!("write conflict"));
        }
        self.updates.lock().unwrap().push(record.clone());
        Ok(record.clone())
    }
}

/// Service plus the collaborators it talks to
pub struct Harness {
    pub dir: TempDir,
    pub service: MappingService,
    pub tariffs: Arc<CountingCrud<TariffRecord>>,
    pub hardware: Arc<CountingCrud<HardwareRecord>>,
    pub stocks: Arc<CountingCrud<StockRecord>>,
}

impl Harness {
    pub fn new(
        tariffs: CountingCrud<TariffRecord>,
        hardware: CountingCrud<HardwareRecord>,
        stocks: CountingCrud<StockRecord>,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let tariffs = Arc::new(tariffs);
        let hardware = Arc::new(hardware);
        let stocks = Arc::new(stocks);

        let backends = Backends {
            tariffs: tariffs.clone(),
            hardware: hardware.clone(),
            stocks: stocks.clone(),
        };
        let staging = StagingStore::new(dir.path().join("staging"), Duration::from_secs(1800));
        let service =
            MappingService::new(staging, Arc::new(FieldDictionaries::builtin()), backends);

        Self {
            dir,
            service,
            tariffs,
            hardware,
            stocks,
        }
    }

    pub fn empty() -> Self {
        Self::new(
            CountingCrud::new(Vec::new()),
            CountingCrud::new(Vec::new()),
            CountingCrud::new(Vec::new()),
        )
    }

    pub fn staging_root(&self) -> PathBuf {
        self.dir.path().join("staging")
    }
}
