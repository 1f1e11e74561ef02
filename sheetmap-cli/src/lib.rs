//! Spreadsheet column mapping and row reconciliation for tariff, hardware and
//! stock records.

pub mod config;
pub mod domain;
pub mod import;
pub mod store;

pub use config::Config;
