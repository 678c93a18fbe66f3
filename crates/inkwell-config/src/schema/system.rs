//! System configuration types: document store and logging.

use serde::{Deserialize, Serialize};

/// Document store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub base_url: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".into(),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "inkwell=trace",
            LogLevel::Debug => "inkwell=debug",
            LogLevel::Info => "inkwell=info",
            LogLevel::Warn => "inkwell=warn",
            LogLevel::Error => "inkwell=error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
