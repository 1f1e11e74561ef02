//! Cell value coercion and field helpers
//!
//! Pure functions turning a raw cell string into a typed value or a list
//! mutation. Record specific dispatch lives in `apply`.

use serde::{Deserialize, Serialize};

use crate::domain::OptionEntry;

/// Number of highlight slots of a tariff
pub const HIGHLIGHT_SLOTS: usize = 5;

/// How unparseable numeric cells are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberPolicy {
    /// Store zero and log a warning
    #[default]
    Lenient,
    /// Fail the record with a cell format error
    Strict,
}

/// Cell text that a strict numeric field cannot accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotANumber;

/// Parse a decimal number, accepting a comma as decimal separator ("34,99" -> 34.99)
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Parse a whole number; decimal input is truncated toward zero ("12,0" -> 12)
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(i);
    }
    parse_decimal(trimmed)
        .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| f.trunc() as i64)
}

/// Coerce a cell to a decimal under `policy`; only `Strict` can fail
pub fn coerce_decimal(raw: &str, policy: NumberPolicy) -> Result<f64, NotANumber> {
    match (parse_decimal(raw), policy) {
        (Some(value), _) => Ok(value),
        (None, NumberPolicy::Lenient) => {
            log::warn!("Cell value '{}' is not a number, storing 0", raw);
            Ok(0.0)
        }
        (None, NumberPolicy::Strict) => Err(NotANumber),
    }
}

/// Coerce a cell to a whole number under `policy`; only `Strict` can fail
pub fn coerce_integer(raw: &str, policy: NumberPolicy) -> Result<i64, NotANumber> {
    match (parse_integer(raw), policy) {
        (Some(value), _) => Ok(value),
        (None, NumberPolicy::Lenient) => {
            log::warn!("Cell value '{}' is not a whole number, storing 0", raw);
            Ok(0)
        }
        (None, NumberPolicy::Strict) => Err(NotANumber),
    }
}

/// Trailing digit of a slot key, e.g. "highlight3" -> 3
pub fn trailing_digit(field_key: &str) -> Option<u32> {
    field_key.chars().last()?.to_digit(10)
}

/// 0-based slot of a positional field key with the given prefix, e.g.
/// ("highlight4", "highlight", 5) -> 3
pub fn slot_index(field_key: &str, prefix: &str, slots: usize) -> Option<usize> {
    let digits = field_key.strip_prefix(prefix)?;
    if digits.len() != 1 {
        return None;
    }
    let n = trailing_digit(digits)? as usize;
    (1..=slots).contains(&n).then(|| n - 1)
}

/// Replace the value of the first entry with `key`, or append a new entry
pub fn upsert_option(options: &mut Vec<OptionEntry>, key: &str, value: &str) {
    match options.iter_mut().find(|o| o.key == key) {
        Some(existing) => existing.value = value.to_string(),
        None => options.push(OptionEntry::new(key, value)),
    }
}

/// Option key of an inclusive benefit slot, e.g. "bullet2" -> "tariff_inclusive_benefit2"
pub fn benefit_key(field_key: &str) -> Option<String> {
    let digit = trailing_digit(field_key)?;
    Some(format!("tariff_inclusive_benefit{}", digit))
}

/// Option key of a WKZ category, e.g. "supplierWkz" -> "supplier"
pub fn wkz_key(field_key: &str) -> Option<&str> {
    field_key.strip_suffix("Wkz").filter(|k| !k.is_empty())
}

/// Fixed-size positional list seeded from a record's current values
#[derive(Debug, Clone, PartialEq)]
pub struct Slots {
    values: Vec<String>,
}

impl Slots {
    pub fn seeded(current: &[String], size: usize) -> Self {
        let mut values: Vec<String> = current.iter().take(size).cloned().collect();
        values.resize(size, String::new());
        Self { values }
    }

    pub fn set(&mut self, index: usize, value: &str) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.to_string();
        }
    }

    /// Slots with trailing empty entries removed
    pub fn into_trimmed(mut self) -> Vec<String> {
        while self.values.last().is_some_and(|v| v.is_empty()) {
            self.values.pop();
        }
        self.values
    }
}
