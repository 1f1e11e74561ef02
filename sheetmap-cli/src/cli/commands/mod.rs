pub mod apply;
pub mod preview;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use sheetmap::Config;
use sheetmap::domain::{HardwareRecord, StockRecord, TariffRecord};
use sheetmap::import::sheet::parse_cell_name;
use sheetmap::import::{Backends, MappingEntry, MappingService, StagingStore};
use sheetmap::store::JsonStore;

#[derive(Args)]
pub struct PreviewCommand {
    /// Spreadsheet (.xlsx) to stage
    pub file: PathBuf,

    /// Upload type: tariff, hardware or stocks
    #[arg(short = 't', long = "type")]
    pub upload_type: String,

    /// Reuse an existing session id instead of generating one
    #[arg(short, long)]
    pub session: Option<String>,

    /// Print the mapping options as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplyCommand {
    /// Session id printed by `preview`
    #[arg(short, long)]
    pub session: String,

    /// Upload type: tariff, hardware or stocks
    #[arg(short = 't', long = "type")]
    pub upload_type: String,

    /// Column mapping as `column=fieldKey`; column is a letter (C) or 0-based index (2)
    #[arg(short, long = "map", value_parser = parse_mapping_entry, required = true)]
    pub mapping: Vec<MappingEntry>,

    /// Directory holding tariffs.json, hardware.json and stocks.json
    #[arg(short, long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Write failures to an Excel report
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Delete the staged spreadsheet afterwards
    #[arg(long)]
    pub discard: bool,
}

/// Parse `C=basicCharge` or `2=basicCharge`
pub fn parse_mapping_entry(s: &str) -> Result<MappingEntry, String> {
    let (column, field_key) = s
        .split_once('=')
        .ok_or_else(|| format!("expected column=fieldKey, got '{}'", s))?;
    let (column, field_key) = (column.trim(), field_key.trim());
    if field_key.is_empty() {
        return Err(format!("missing field key in '{}'", s));
    }

    let column_index = if column.chars().all(|c| c.is_ascii_digit()) && !column.is_empty() {
        column
            .parse::<u32>()
            .map_err(|e| format!("invalid column index '{}': {}", column, e))?
    } else if column.chars().all(|c| c.is_ascii_alphabetic()) {
        let (col, _) = parse_cell_name(&format!("{}1", column))
            .ok_or_else(|| format!("invalid column '{}'", column))?;
        col - 1
    } else {
        return Err(format!("invalid column '{}'", column));
    };

    Ok(MappingEntry::new(column_index, field_key))
}

/// Wire the mapping service to JSON record files below `data_dir`
pub async fn build_service(config: &Config, data_dir: &Path) -> Result<MappingService> {
    let backends = Backends {
        tariffs: Arc::new(
            JsonStore::<TariffRecord>::open(data_dir.join("tariffs.json"))
                .await
                .context("Failed to load tariffs")?,
        ),
        hardware: Arc::new(
            JsonStore::<HardwareRecord>::open(data_dir.join("hardware.json"))
                .await
                .context("Failed to load hardware")?,
        ),
        stocks: Arc::new(
            JsonStore::<StockRecord>::open(data_dir.join("stocks.json"))
                .await
                .context("Failed to load stocks")?,
        ),
    };
    service_with(config, backends).await
}

/// Mapping service without any records, enough for staging and preview
pub async fn preview_service(config: &Config) -> Result<MappingService> {
    let backends = Backends {
        tariffs: Arc::new(JsonStore::<TariffRecord>::in_memory(Vec::new())),
        hardware: Arc::new(JsonStore::<HardwareRecord>::in_memory(Vec::new())),
        stocks: Arc::new(JsonStore::<StockRecord>::in_memory(Vec::new())),
    };
    service_with(config, backends).await
}

async fn service_with(config: &Config, backends: Backends) -> Result<MappingService> {
    let dictionaries = config.dictionaries()?;
    let staging = StagingStore::new(&config.staging_root, config.cleanup_after());
    match staging.sweep_expired().await {
        Ok(0) => {}
        Ok(removed) => log::info!("Removed {} expired upload sessions", removed),
        Err(e) => log::warn!(
            "Failed to sweep {}: {}",
            config.staging_root.display(),
            e
        ),
    }
    Ok(MappingService::new(staging, Arc::new(dictionaries), backends)
        .with_number_policy(config.number_policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_entry() {
        assert_eq!(
            parse_mapping_entry("C=basicCharge").unwrap(),
            MappingEntry::new(2, "basicCharge")
        );
        assert_eq!(
            parse_mapping_entry("0=ebootisId").unwrap(),
            MappingEntry::new(0, "ebootisId")
        );
        assert_eq!(
            parse_mapping_entry("aa = price").unwrap(),
            MappingEntry::new(26, "price")
        );
        assert!(parse_mapping_entry("C").is_err());
        assert!(parse_mapping_entry("C=").is_err());
        assert!(parse_mapping_entry("C3=price").is_err());
    }
}
