//! Error types for the designpref pipeline
//!
//! This module provides error handling using thiserror for structured error
//! definitions and anyhow for propagation at the binary boundary.

use thiserror::Error;

/// Main error type for designpref operations
#[derive(Error, Debug)]
pub enum DesignPrefError {
    /// Environment used before `reset`
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rule record could not be turned into a typed rule
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Schema validation failed
    #[error("Validation failed at line {line}: {message}")]
    Validation { line: usize, message: String },

    /// Malformed JSON line in a line-delimited input
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Shared classifier lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for designpref operations
pub type Result<T> = std::result::Result<T, DesignPrefError>;

/// Convert anyhow::Error to DesignPrefError
impl From<anyhow::Error> for DesignPrefError {
    fn from(err: anyhow::Error) -> Self {
        DesignPrefError::Other(err.to_string())
    }
}
