//! Domain records targeted by spreadsheet imports
//!
//! Each record kind comes with a lightweight lookup summary (what a `list`
//! query returns) and the full record (what `read`/`update` round-trip).

pub mod crud;
pub mod hardware;
pub mod option;
pub mod stock;
pub mod tariff;

pub use crud::{CrudService, FilterOption, LookupSummary, StoredRecord};
pub use hardware::{HardwareLookup, HardwareRecord, VariantRecord};
pub use option::{OptionEntry, PricingInterval};
pub use stock::{StockLookup, StockRecord};
pub use tariff::{TariffLookup, TariffRecord};
