//! Error types for configuration assembly and loading.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while assembling or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    // Entry discovery errors
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    // Loader rule errors
    #[error("invalid loader pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // Fragment/settings loading errors
    #[error("config not found")]
    NotFound,

    #[error("unsupported fragment format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config value for '{field}'{}", hint.as_deref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidValue { field: String, hint: Option<String> },

    #[error("settings could not be loaded: {0}")]
    Settings(#[from] Box<figment::Error>),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Settings(Box::new(err))
    }
}
