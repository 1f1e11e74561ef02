//! Runtime configuration
//!
//! Loaded from `$SHEETMAP_CONFIG` if set, otherwise from
//! `<config dir>/sheetmap/config.toml`. A missing file means defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::import::{FieldDictionaries, NumberPolicy};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "SHEETMAP_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one subdirectory per upload session
    pub staging_root: PathBuf,
    /// Seconds until an untouched upload session is deleted
    pub cleanup_after_secs: u64,
    pub number_policy: NumberPolicy,
    /// Label overrides: upload type -> field key -> label
    pub labels: HashMap<String, HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_root: std::env::temp_dir().join("sheetmap"),
            cleanup_after_secs: 30 * 60,
            number_policy: NumberPolicy::default(),
            labels: HashMap::new(),
        }
    }
}

impl Config {
    /// Load from the configured location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// `$SHEETMAP_CONFIG`, else `<config dir>/sheetmap/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }
        dirs::config_dir().map(|dir| dir.join("sheetmap").join("config.toml"))
    }

    pub fn cleanup_after(&self) -> Duration {
        Duration::from_secs(self.cleanup_after_secs)
    }

    /// Built-in field dictionaries with this config's label overrides applied
    pub fn dictionaries(&self) -> Result<FieldDictionaries> {
        FieldDictionaries::builtin()
            .with_overrides(&self.labels)
            .context("Invalid [labels] section")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::UploadType;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cleanup_after(), Duration::from_secs(1800));
        assert_eq!(config.number_policy, NumberPolicy::Lenient);
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
staging_root = "/var/lib/sheetmap"
cleanup_after_secs = 60
number_policy = "strict"

[labels.hardware]
price = "EK netto"
"#,
        )
        .unwrap();

        assert_eq!(config.staging_root, PathBuf::from("/var/lib/sheetmap"));
        assert_eq!(config.cleanup_after(), Duration::from_secs(60));
        assert_eq!(config.number_policy, NumberPolicy::Strict);

        let dicts = config.dictionaries().unwrap();
        assert_eq!(dicts.get(UploadType::Hardware).label("price"), Some("EK netto"));
    }

    #[test]
    fn test_unknown_label_key_is_rejected() {
        let config = Config::from_toml_str(
            r#"
[labels.tariff]
monthlyFee = "Monthly fee"
"#,
        )
        .unwrap();

        assert!(config.dictionaries().is_err());
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        assert!(Config::from_toml_str(r#"number_policy = "fuzzy""#).is_err());
    }
}
