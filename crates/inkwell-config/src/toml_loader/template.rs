//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# Inkwell Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[backend]
# chat_url = "http://localhost:8787/chat"
# connect_timeout_secs = 10   # 1-120

[framing]
# event_prefix = "data:"
# done_sentinel = "[DONE]"
# content_field = "response"
# max_line_bytes = 1048576    # 1024-67108864

[chat]
# context_trigger = "@writer"
# empty_answer = "complete"     # complete, error
# missing_sentinel = "complete" # complete, error
# turn_timeout_secs = 0         # 0 disables, max 3600

[documents]
# base_url = "http://localhost:8787"

[logging]
# level = "info"              # trace, debug, info, warn, error
"##
}
