use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use illustra_core::{Carrier, ParseOptions, Toggles};

pub const DEFAULT_CONFIG: &str = "illustra.toml";
pub const DEFAULT_SESSION: &str = "illustra.session.json";
pub const DEFAULT_STORE_DIR: &str = ".illustra";
const STORE_DIR_ENV: &str = "ILLUSTRA_STORE_DIR";

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub toggles: Toggles,
    /// Page-window defaults keyed by carrier id.
    #[serde(default)]
    pub carriers: BTreeMap<String, ParseOptions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// `ILLUSTRA_STORE_DIR` wins over `[store] dir`.
    pub fn store_dir(&self) -> PathBuf {
        env::var_os(STORE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.store.dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }

    pub fn session_path(&self) -> PathBuf {
        self.session
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION))
    }

    pub fn carrier_defaults(&self, carrier: Carrier) -> ParseOptions {
        self.carriers
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(carrier.as_str()))
            .map(|(_, opts)| *opts)
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        for name in self.carriers.keys() {
            name.parse::<Carrier>()
                .map_err(|e| anyhow!("invalid [carriers.{name}] section: {e}"))?;
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).map_err(|e| anyhow!("invalid config: {e}"))?;
    config.validate()?;
    Ok(config)
}
