//! Tool registration and execution errors.

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool already registered: {0}")]
    Duplicate(String),

    /// Carries the requested name for logging; the model only sees
    /// "unknown tool".
    #[error("unknown tool")]
    UnknownTool(String),

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("access denied: {0}")]
    Sandbox(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tool panicked: {0}")]
    Panicked(String),
}
