//! Error types and handling for Solstat
//!
//! This module defines the error types used throughout the daemon and the
//! classification of which failures terminate the process.

use thiserror::Error;

/// Result type alias for Solstat operations
pub type Result<T> = std::result::Result<T, SolstatError>;

/// Main error type for Solstat
#[derive(Debug, Error)]
pub enum SolstatError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Historical record store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Indicator output (GPIO) errors
    #[error("Indicator error: {message}")]
    Indicator { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// API integration errors (weather, vendor)
    #[error("API error: {message}")]
    Api { message: String },

    /// Authentication/authorization errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

}

impl SolstatError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SolstatError::Config {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        SolstatError::Store {
            message: message.into(),
        }
    }

    /// Create a new indicator error
    pub fn indicator<S: Into<String>>(message: S) -> Self {
        SolstatError::Indicator {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        SolstatError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        SolstatError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        SolstatError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        SolstatError::Api {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        SolstatError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        SolstatError::Auth {
            message: message.into(),
        }
    }


    /// Whether this error class stops the daemon.
    ///
    /// Store connectivity, weather API misconfiguration (bad key, bad
    /// location) and invalid configuration are fatal; everything else is
    /// absorbed by the cycle that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SolstatError::Store { .. }
                | SolstatError::Auth { .. }
                | SolstatError::Config { .. }
                | SolstatError::Validation { .. }
        )
    }
}

impl From<std::io::Error> for SolstatError {
    fn from(err: std::io::Error) -> Self {
        SolstatError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SolstatError {
    fn from(err: serde_yaml::Error) -> Self {
        SolstatError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SolstatError {
    fn from(err: serde_json::Error) -> Self {
        SolstatError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SolstatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SolstatError::timeout(err.to_string())
        } else {
            SolstatError::network(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for SolstatError {
    fn from(err: rusqlite::Error) -> Self {
        SolstatError::store(err.to_string())
    }
}
