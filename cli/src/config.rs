use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::PathBuf;

use macroplan_core::catalog::FoodCatalog;
use macroplan_core::nutrition::DEFAULT_MAX_GRAMS;

const DATA_DIR_VAR: &str = "MACROPLAN_DATA_DIR";
const CATALOG_VAR: &str = "MACROPLAN_CATALOG";
const MAX_GRAMS_VAR: &str = "MACROPLAN_MAX_GRAMS";

pub struct Config {
    pub data_dir: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub max_grams: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = Self::from_env_with(|k| std::env::var(k).ok())?;
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                config.data_dir.display()
            )
        })?;
        Ok(config)
    }

    /// Resolve settings through `get` instead of the process environment, so
    /// tests can supply their own values.
    pub fn from_env_with<F>(mut get: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let data_dir = match get(DATA_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "macroplan")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };

        let catalog_path = match get(CATALOG_VAR).filter(|v| !v.trim().is_empty()) {
            Some(path) => Some(PathBuf::from(path)),
            None => ["foods.csv", "foods.json"]
                .iter()
                .map(|name| data_dir.join(name))
                .find(|p| p.exists()),
        };

        let max_grams = match get(MAX_GRAMS_VAR) {
            Some(raw) => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid {MAX_GRAMS_VAR}: '{raw}'"))?;
                if !value.is_finite() || value <= 0.0 {
                    bail!("{MAX_GRAMS_VAR} must be greater than 0");
                }
                value
            }
            None => DEFAULT_MAX_GRAMS,
        };

        Ok(Config {
            data_dir,
            catalog_path,
            max_grams,
        })
    }

    pub fn load_catalog(&self) -> Result<FoodCatalog> {
        match &self.catalog_path {
            Some(path) => FoodCatalog::load(path),
            None => Ok(FoodCatalog::builtin()),
        }
    }
}
