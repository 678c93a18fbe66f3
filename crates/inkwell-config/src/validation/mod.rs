//! Full configuration validation.
//!
//! Each check pushes onto a shared error list; the orchestrator joins
//! them into a single `ConfigError`.

mod helpers;


use crate::schema::InkwellConfig;
use inkwell_common::ConfigError;

use helpers::{validate_non_empty, validate_range};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &InkwellConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_non_empty(&mut errors, "backend.chat_url", &config.backend.chat_url);
    validate_range(
        &mut errors,
        "backend.connect_timeout_secs",
        config.backend.connect_timeout_secs,
        1,
        120,
    );

    validate_non_empty(&mut errors, "framing.event_prefix", &config.framing.event_prefix);
    validate_non_empty(&mut errors, "framing.done_sentinel", &config.framing.done_sentinel);
    validate_non_empty(&mut errors, "framing.content_field", &config.framing.content_field);
    validate_range(
        &mut errors,
        "framing.max_line_bytes",
        config.framing.max_line_bytes,
        1024,
        64 * 1024 * 1024,
    );

    validate_non_empty(&mut errors, "chat.context_trigger", &config.chat.context_trigger);
    validate_range(
        &mut errors,
        "chat.turn_timeout_secs",
        config.chat.turn_timeout_secs,
        0,
        3600,
    );

    validate_non_empty(&mut errors, "documents.base_url", &config.documents.base_url);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
