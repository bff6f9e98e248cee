//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::{global_config_path, Config};

type Builder = LibConfigBuilder<config::builder::DefaultState>;

/// Legacy environment variables and the config keys they override
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("GPSS_API_KEY", "search.api_key"),
    ("QWEN_API_URL", "ai.api_base_url"),
    ("QWEN_MODEL", "ai.model"),
];

/// Helper to set a config override with consistent error mapping
fn set_config_override(builder: Builder, key: &str, value: String) -> Result<Builder> {
    builder
        .set_override(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} override: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `PATENTSEARCH_` and use double underscores
    /// for nested values. For example:
    /// - `PATENTSEARCH_AI__PROVIDER=offline`
    /// - `PATENTSEARCH_ENRICHMENT__MAX_CONCURRENT_REQUESTS=8`
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = ConfigLib::builder();

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        // Add environment variables with PATENTSEARCH_ prefix
        builder = builder.add_source(
            Environment::with_prefix("PATENTSEARCH")
                .separator("__")
                .try_parsing(true),
        );

        // Support the environment variables of earlier deployments
        for (var, key) in LEGACY_ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    builder = set_config_override(builder, key, value)?;
                }
            }
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.patentsearch/config.toml or custom --config path)
    /// 3. Environment variables (PATENTSEARCH_*)
    /// 4. Legacy variables (GPSS_API_KEY, QWEN_API_URL, QWEN_MODEL)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
