//! Configuration schema types for Inkwell.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod backend;
mod chat;
mod system;

pub use backend::*;
pub use chat::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Inkwell.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InkwellConfig {
    pub backend: BackendConfig,
    pub framing: FramingConfig,
    pub chat: ChatConfig,
    pub documents: DocumentsConfig,
    pub logging: LoggingConfig,
}
