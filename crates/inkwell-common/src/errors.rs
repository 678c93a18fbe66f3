use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InkwellError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("chat error: {0}")]
    Chat(String),

    #[error("document error: {0}")]
    Document(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("framing.done_sentinel is empty".into());
        assert_eq!(
            err.to_string(),
            "config validation error: framing.done_sentinel is empty"
        );
    }

    #[test]
    fn inkwell_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: InkwellError = config_err.into();
        assert!(matches!(err, InkwellError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn inkwell_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let err: InkwellError = io_err.into();
        assert!(matches!(err, InkwellError::Io(_)));
        assert!(err.to_string().contains("stdout closed"));
    }

    #[test]
    fn inkwell_error_other_variants() {
        let err = InkwellError::Chat("turn in flight".into());
        assert_eq!(err.to_string(), "chat error: turn in flight");

        let err = InkwellError::Document("not found".into());
        assert_eq!(err.to_string(), "document error: not found");
    }
}
