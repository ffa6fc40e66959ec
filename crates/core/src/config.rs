//! Application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{keeper::EXPORT_FILE_NAME, reconcile::ImportMode};

/// Directory under the user's config and data directories.
pub const APP_DIR: &str = "lootkeeper";
/// Prefix for environment variable overrides, e.g. `LOOTKEEPER_DATA_DIR`.
pub const ENV_PREFIX: &str = "LOOTKEEPER";

const DEFAULT_CONFIG: &str = r#"# Loot Keeper configuration.
#
# Every value can be overridden with an environment variable, e.g.
# LOOTKEEPER_DATA_DIR=/tmp/loot lootkeeper show

# Directory holding lootDefs.json, poolDefs.json and playerDefs.json.
# data_dir = "/home/me/.local/share/lootkeeper"

# File name written by `lootkeeper export`.
export_file_name = "loot-keeper-export.json"

# Merge strategy used by `lootkeeper import` when none is given:
# override, add-new-loot-only or update-and-add.
default_import_mode = "override"

# tracing filter directive used when RUST_LOG is not set.
log_filter = "info"
"#;

/// Resolved configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the persisted collections and logs.
    pub data_dir: PathBuf,
    /// File name used when exporting.
    pub export_file_name: String,
    /// Merge strategy used when an import does not name one.
    pub default_import_mode: ImportMode,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_file_name: EXPORT_FILE_NAME.to_string(),
            default_import_mode: ImportMode::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (if it exists) layered over the defaults, then the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("export_file_name", defaults.export_file_name)?
            .set_default("default_import_mode", "override")?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// Directory the persisted collections are stored in.
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    /// Directory log files are written to.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Location of the user's config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Default data directory under the user's data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(config_path())
}

/// Write a commented default config file at `path` if none exists yet.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}
