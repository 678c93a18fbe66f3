//! Inkwell configuration system.
//!
//! TOML-based configuration with validation. Every section uses serde
//! defaults, so a partial config file (or none at all) works.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use inkwell_config::{config_to_json, load_config};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    AnswerPolicy, BackendConfig, ChatConfig, DocumentsConfig, FramingConfig, InkwellConfig,
    LogLevel, LoggingConfig, CONFIG_SCHEMA_VERSION,
};

use inkwell_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path.
///
/// Creates a commented default `config.toml` if none exists yet.
pub fn load_config() -> Result<InkwellConfig, ConfigError> {
    toml_loader::load_default()
}

/// Load config from an explicit path (the `--config` override).
pub fn load_config_from(path: &Path) -> Result<InkwellConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    toml_loader::load_from_path(path)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &InkwellConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
