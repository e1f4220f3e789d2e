//! Tracker error types

use spyglass_core::{ConfigError, RootSelector};
use thiserror::Error;

/// Errors reported by the viewport tracker
#[derive(Error, Debug)]
pub enum SpyError {
    /// Configuration rejected by validation
    #[error("Invalid spy configuration: {0}")]
    Config(#[from] ConfigError),

    /// The observed scroll root could not be measured
    #[error("Scroll root {0} is not available")]
    RootUnavailable(RootSelector),

    /// Operation needs a mounted tracker
    #[error("Tracker is not mounted")]
    NotMounted,
}

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, SpyError>;
