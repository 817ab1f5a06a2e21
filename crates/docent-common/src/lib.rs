pub mod errors;
pub mod id;

pub use errors::{ConfigError, DocentError};
pub use id::{new_correlation_id, new_id, SessionId};

/// Placeholder replaced by the user's literal input in a query template.
pub const INPUT_PLACEHOLDER: &str = "{input}";

pub type Result<T> = std::result::Result<T, DocentError>;
