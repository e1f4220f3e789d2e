//! Configuration error types

use thiserror::Error;

/// Errors raised while loading or validating a spy configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No class name given for the current item
    #[error("current_class_name must not be empty")]
    MissingCurrentClass,

    /// Offset is NaN or infinite
    #[error("offset must be a finite number, got {0}")]
    InvalidOffset(f32),

    /// TOML document could not be parsed
    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON document could not be parsed
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// File extension is neither `.toml` nor `.json`
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
