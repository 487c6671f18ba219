use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::graph_store::StoreConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BelStoreConfig {
    pub database: Option<String>,
    pub extract_information: Option<bool>,
    pub warm_start_cache: Option<bool>,
}

impl BelStoreConfig {
    /// Store behaviour, with unset keys falling back to the defaults
    pub fn store_config(&self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            extract_information: self.extract_information.unwrap_or(defaults.extract_information),
            warm_start_cache: self.warm_start_cache.unwrap_or(defaults.warm_start_cache),
        }
    }

    /// Database path from the config, or the default under `base`
    pub fn database_path_in(&self, base: &Path) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(base))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("belstore.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".belstore").join("belstore.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<BelStoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: BelStoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &BelStoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
