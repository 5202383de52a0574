use dirs::home_dir;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::structs::Catalog;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "FEDSPLIT_DATA_DIR";

/// File name of the backend catalog inside the data directory
const CATALOG_FILE: &str = "catalog.json";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid catalog {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

fn get_default_fedsplit_dir() -> PathBuf {
    if let Some(mut hd) = home_dir() {
        hd.push(".fedsplit");
        hd
    } else {
        PathBuf::from(".fedsplit")
    }
}

pub fn get_data_dir() -> PathBuf {
    // Try to get custom data directory from environment variable first
    if let Ok(custom_dir) = std::env::var(DATA_DIR_ENV) {
        let path = PathBuf::from(custom_dir);
        if path.is_absolute() {
            return path;
        }
        log::warn!("Ignoring relative {}: {}", DATA_DIR_ENV, path.display());
    }
    get_default_fedsplit_dir()
}

pub fn default_catalog_path() -> PathBuf {
    get_data_dir().join(CATALOG_FILE)
}

/// Load a catalog from an explicit JSON file. Missing or malformed files are errors.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let catalog: Catalog =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
    info!(
        "Loaded catalog from {}: {} backend(s), {} table route(s), default_backend={:?}",
        path.display(),
        catalog.backends.len(),
        catalog.tables.len(),
        catalog.default_backend
    );
    Ok(catalog)
}

/// Load the catalog from the data directory; an absent file yields an empty catalog.
pub fn load_default_catalog() -> Result<Catalog, ConfigError> {
    let path = default_catalog_path();
    if !path.exists() {
        log::warn!("No catalog at {}, using an empty catalog", path.display());
        return Ok(Catalog::default());
    }
    load_catalog(&path)
}
