use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("missing credential: set {0} in the environment or a .env file")]
    MissingCredential(String),
}

/// Top-level error surfaced by the `docent` binary.
///
/// The AI crate keeps its own richer error type; it is flattened into
/// [`DocentError::Ai`] at the application boundary so this crate stays
/// free of a dependency on it.
#[derive(Debug, thiserror::Error)]
pub enum DocentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("ai error: {0}")]
    Ai(String),

    #[error("interrupted")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}
