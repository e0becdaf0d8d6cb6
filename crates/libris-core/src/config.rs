use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::locale::Locale;

/// Root application configuration, loaded from `~/.config/libris/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub sync: SyncConfig,
    /// Pen name → real name, both written "Family, Given".
    pub pseudonyms: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database_path: String,
    pub covers_directory: String,
    pub locale: Locale,
}

/// Per-field sync actions, keyed by field key. Values are action names
/// (`skip`, `copy_if_blank`, `append`, `overwrite`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    #[serde(flatten)]
    pub actions: BTreeMap<String, String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("libris");

        Self {
            database_path: data_dir.join("libris.db").to_string_lossy().to_string(),
            covers_directory: data_dir.join("covers").to_string_lossy().to_string(),
            locale: Locale::default(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/libris/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LIBRIS_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("libris")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    // ─── Derived paths ─────────────────────────────────────

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.core.database_path)
    }

    pub fn covers_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.covers_directory)
    }

    pub fn locale(&self) -> &Locale {
        &self.core.locale
    }
}
