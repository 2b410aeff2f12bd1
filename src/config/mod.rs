use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    commission::DEFAULT_COMMISSION_RATE,
    core::utils::{ensure_dir, PathResolver},
    errors::LedgerError,
};

const TMP_SUFFIX: &str = "tmp";

/// Tunables for the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Commission assumed for billing entries that carry none, and offered for new products.
    pub default_commission_rate: f64,
    /// Slack allowed when checking that a product's selling price agrees with cost and rate.
    pub amount_tolerance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_commission_rate: DEFAULT_COMMISSION_RATE,
            amount_tolerance: 0.005,
            store_file: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !(0.0..100.0).contains(&self.default_commission_rate) {
            return Err(LedgerError::InvalidRecord(format!(
                "default commission rate must be within [0, 100), got {}",
                self.default_commission_rate
            )));
        }
        if !(self.amount_tolerance >= 0.0) {
            return Err(LedgerError::InvalidRecord(format!(
                "amount tolerance must not be negative, got {}",
                self.amount_tolerance
            )));
        }
        Ok(())
    }
}

/// Loads and saves `config.json` under the application directory.
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            base,
        })
    }

    /// Reads the configuration, falling back to defaults when no file exists.
    pub fn load(&self) -> Result<EngineConfig, LedgerError> {
        let config = if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data)?
        } else {
            EngineConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &EngineConfig) -> Result<(), LedgerError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Store file named by the configuration, or the default one under the base directory.
    pub fn store_path(&self, config: &EngineConfig) -> PathBuf {
        config
            .store_file
            .clone()
            .unwrap_or_else(|| PathResolver::store_file_in(&self.base))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    tmp.set_extension(format!("json.{}", TMP_SUFFIX));
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
