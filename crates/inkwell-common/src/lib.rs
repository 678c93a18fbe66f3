pub mod errors;
pub mod id;

pub use errors::{ConfigError, InkwellError};
pub use id::{new_id, SessionId, TurnId};

pub type Result<T> = std::result::Result<T, InkwellError>;
