use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{RegistryError, RegistryResult};
use crate::evaluator::MissingStatusPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "trqp.toml";

/// Unprefixed variable names still honored by deployments of the registry
const LEGACY_ENV_KEYS: &[&str] = &[
    "port",
    "base_url",
    "registry_name",
    "registry_path",
    "registry_data",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub registry_name: String,
    pub registry_path: String,
    /// Inline registry snapshot; takes precedence over `registry_path`
    #[serde(default)]
    pub registry_data: Option<String>,
    pub log_level: String,
    #[serde(default)]
    pub missing_status_policy: MissingStatusPolicy,
    /// Publish the signing key id in attestation headers
    #[serde(default = "enabled")]
    pub jws_kid_header: bool,
    /// HTML served at `/terms`, the governance framework link in the ecosystem DID
    #[serde(default = "default_terms_path")]
    pub terms_path: String,
}

fn enabled() -> bool {
    true
}

fn default_terms_path() -> String {
    "terms.html".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            base_url: "http://localhost".to_string(),
            registry_name: "Default-TR".to_string(),
            registry_path: "data/registry.json".to_string(),
            registry_data: None,
            log_level: "info".to_string(),
            missing_status_policy: MissingStatusPolicy::default(),
            jws_kid_header: enabled(),
            terms_path: default_terms_path(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> RegistryResult<()> {
        if self.registry_name.trim().is_empty() {
            return Err(RegistryError::config("registry_name cannot be empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(RegistryError::config("base_url cannot be empty"));
        }
        Ok(())
    }

    /// Externally visible origin, e.g. `http://localhost:8082`
    pub fn public_origin(&self) -> String {
        format!("{}:{}", self.base_url.trim_end_matches('/'), self.port)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Defaults, then the TOML file, then `TRQP_*`, then the legacy variable names
pub fn config_figment(toml_path: &Path) -> Figment {
    Figment::from(Serialized::defaults(RegistryConfig::default()))
        .merge(Toml::file(toml_path))
        .merge(Env::prefixed("TRQP_"))
        .merge(Env::raw().only(LEGACY_ENV_KEYS))
}

pub fn load_config() -> RegistryResult<RegistryConfig> {
    load_config_from(Path::new(DEFAULT_CONFIG_FILE))
}

pub fn load_config_from(toml_path: &Path) -> RegistryResult<RegistryConfig> {
    extract(config_figment(toml_path))
}

fn extract(figment: Figment) -> RegistryResult<RegistryConfig> {
    let config: RegistryConfig = figment
        .extract()
        .map_err(|e| RegistryError::config(format!("failed to load configuration: {e}")))?;
    config.validate()?;
    Ok(config)
}
