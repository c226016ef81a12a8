//! Loads the initial trust registry snapshot
//!
//! The snapshot comes from the inline `registry_data` setting when present,
//! otherwise from `registry_path`. YAML is the fallback format because it
//! also accepts JSON documents.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::config_loader::RegistryConfig;
use crate::errors::{RegistryError, RegistryResult};
use crate::model::TrustRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
    Toml,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => SnapshotFormat::Json,
            Some("toml") => SnapshotFormat::Toml,
            _ => SnapshotFormat::Yaml,
        }
    }
}

pub fn parse_registry(raw: &str, format: SnapshotFormat) -> RegistryResult<TrustRegistry> {
    let parsed = match format {
        SnapshotFormat::Json => serde_json::from_str(raw).map_err(|e| e.to_string()),
        SnapshotFormat::Yaml => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        SnapshotFormat::Toml => toml::from_str(raw).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| RegistryError::config(format!("failed to parse registry snapshot: {e}")))
}

pub fn load_registry_file(path: &Path) -> RegistryResult<TrustRegistry> {
    let raw = fs::read_to_string(path).map_err(|e| {
        RegistryError::io(format!("reading registry snapshot {}", path.display()), e)
    })?;
    parse_registry(&raw, SnapshotFormat::from_path(path))
}

pub fn load_registry(config: &RegistryConfig) -> RegistryResult<TrustRegistry> {
    match config.registry_data.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(inline) => {
            info!("Loading registry from inline registry_data");
            parse_registry(inline, SnapshotFormat::Yaml)
        }
        None => {
            info!(path = %config.registry_path, "Loading registry from file");
            load_registry_file(Path::new(&config.registry_path))
        }
    }
}
