//! Apply a row's mapped cells to a record

use crate::domain::{HardwareRecord, StockRecord, TariffRecord};

use super::error::ImportError;
use super::identifier::IdentifierKind;
use super::transform::{
    HIGHLIGHT_SLOTS, NumberPolicy, Slots, benefit_key, coerce_decimal, coerce_integer, slot_index,
    upsert_option, wkz_key,
};

/// Number of inclusive benefit slots of a tariff
const BENEFIT_SLOTS: usize = 6;

/// A mapped column's cell in the current row
#[derive(Debug, Clone, PartialEq)]
pub struct MappedCell {
    /// A1-style address
    pub cell: String,
    pub field_key: String,
    pub value: String,
}

/// Everything a record needs to apply one row
#[derive(Debug, Clone)]
pub struct RowContext<'a> {
    /// 1-based spreadsheet row
    pub row: u32,
    pub identifier: IdentifierKind,
    pub identifier_value: &'a str,
    /// Mapped cells in mapping order
    pub cells: &'a [MappedCell],
    pub policy: NumberPolicy,
}

/// A record kind that spreadsheet rows can update
pub trait RowTarget: Clone + Send + Sync + 'static {
    fn record_id(&self) -> &str;

    /// Apply all mapped cells of a row in mapping order.
    ///
    /// Field keys the record does not know are ignored. An error means the
    /// record is in an unknown state and must not be persisted.
    fn apply_row(&mut self, ctx: &RowContext<'_>) -> Result<(), ImportError>;
}

fn decimal(cell: &MappedCell, policy: NumberPolicy) -> Result<f64, ImportError> {
    coerce_decimal(&cell.value, policy).map_err(|_| ImportError::CellFormat {
        cell: cell.cell.clone(),
        value: cell.value.clone(),
    })
}

fn integer(cell: &MappedCell, policy: NumberPolicy) -> Result<i64, ImportError> {
    coerce_integer(&cell.value, policy).map_err(|_| ImportError::CellFormat {
        cell: cell.cell.clone(),
        value: cell.value.clone(),
    })
}

impl RowTarget for TariffRecord {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn apply_row(&mut self, ctx: &RowContext<'_>) -> Result<(), ImportError> {
        let mut highlights = Slots::seeded(&self.highlights, HIGHLIGHT_SLOTS);
        let mut highlights_mapped = false;

        for cell in ctx.cells {
            let value = cell.value.as_str();
            match cell.field_key.as_str() {
                "basicCharge" => {
                    let price = decimal(cell, ctx.policy)?;
                    self.basic_charge = price;
                    if let Some(interval) = self.pricing_intervals.get_mut(0) {
                        interval.price = price;
                    }
                    upsert_option(
                        &mut self.bullets,
                        "tariff_monthly_price",
                        &format!("{} €", value),
                    );
                }
                "basicChargeRenewal" => {
                    let price = decimal(cell, ctx.policy)?;
                    self.basic_charge_renewal = price;
                    if let Some(interval) = self.pricing_intervals.get_mut(1) {
                        interval.price = price;
                    }
                }
                "leadType" => self.lead_type = integer(cell, ctx.policy)?,
                "provision" => self.provision = decimal(cell, ctx.policy)?,
                "xProvision" => self.x_provision = decimal(cell, ctx.policy)?,
                "connectionFee" => {
                    self.connection_fee = decimal(cell, ctx.policy)?;
                    upsert_option(
                        &mut self.bullets,
                        "tariff_connection_fee",
                        &format!("{} €", value),
                    );
                }
                "dataVolume" => self.data_volume = decimal(cell, ctx.policy)?,
                "legalNote" => self.legal_note = value.to_string(),
                "pibLink" => self.pib_link = value.to_string(),
                key if key.starts_with("highlight") => {
                    if let Some(slot) = slot_index(key, "highlight", HIGHLIGHT_SLOTS) {
                        highlights.set(slot, value);
                        highlights_mapped = true;
                    }
                }
                key if key.starts_with("bullet") => {
                    if slot_index(key, "bullet", BENEFIT_SLOTS).is_some() {
                        if let Some(option_key) = benefit_key(key) {
                            upsert_option(&mut self.bullets, &option_key, value);
                        }
                    }
                }
                key @ ("supplierWkz" | "tariffWkz") => {
                    if let Some(option_key) = wkz_key(key) {
                        upsert_option(&mut self.wkz, option_key, value);
                    }
                }
                _ => {}
            }
        }

        if highlights_mapped {
            self.highlights = highlights.into_trimmed();
        }
        Ok(())
    }
}

impl RowTarget for HardwareRecord {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn apply_row(&mut self, ctx: &RowContext<'_>) -> Result<(), ImportError> {
        for cell in ctx.cells {
            match cell.field_key.as_str() {
                "manufactWkz" => upsert_option(&mut self.wkz, "manufacturer", &cell.value),
                "ek24Wkz" => upsert_option(&mut self.wkz, "ek24", &cell.value),
                "price" => {
                    let price = decimal(cell, ctx.policy)?;
                    let variant = match ctx.identifier {
                        IdentifierKind::EbootisId => self.variant_mut(ctx.identifier_value),
                        IdentifierKind::ExternalArticleNumber => {
                            self.variant_by_article_no_mut(ctx.identifier_value)
                        }
                    };
                    let Some(variant) = variant else {
                        return Err(ImportError::VariantNotFound {
                            kind: ctx.identifier,
                            value: ctx.identifier_value.to_string(),
                        });
                    };
                    variant.price = price;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl RowTarget for StockRecord {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn apply_row(&mut self, ctx: &RowContext<'_>) -> Result<(), ImportError> {
        for cell in ctx.cells {
            match cell.field_key.as_str() {
                "currentStock" => self.current_stock = integer(cell, ctx.policy)?,
                "originalStock" => self.original_stock = integer(cell, ctx.policy)?,
                _ => {}
            }
        }
        Ok(())
    }
}
