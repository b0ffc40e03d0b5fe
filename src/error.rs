//! Error types for Ratekey.
//!
//! Key derivation itself never fails; these cover the configuration and
//! input handling that surrounds it.

use thiserror::Error;

/// Main error type for Ratekey operations.
#[derive(Error, Debug)]
pub enum KeyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A limit category label that cannot be used (e.g. empty)
    #[error("Invalid limit category: {0:?}")]
    InvalidCategory(String),

    /// A limit category not present in the configured category list
    #[error("Unknown limit category: {0}")]
    UnknownCategory(String),

    /// Malformed request input
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Ratekey operations.
pub type Result<T> = std::result::Result<T, KeyError>;
