use thiserror::Error;

/// The universal error type for Chorus protocol adapters.
#[derive(Error, Debug)]
pub enum ChorusError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Presence error: {0}")]
    Presence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for Chorus operations.
pub type Result<T> = std::result::Result<T, ChorusError>;
