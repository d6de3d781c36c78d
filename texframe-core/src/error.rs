//! Error types for texframe

use thiserror::Error;

/// Main error type for texframe process-level operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TexFrameError {
    /// A native library and all of its fallbacks failed to load
    #[error("Failed to load native library {name}: {reason}")]
    NativeLibrary {
        /// Primary library name
        name: String,
        /// Loader message for the last attempt
        reason: String,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {key}")]
    MissingConfiguration {
        /// Missing option key
        key: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfiguration {
        /// Option key
        key: String,
        /// What is wrong with the value
        message: String,
    },

    /// Option bundle could not be parsed
    #[error("Failed to parse options: {reason}")]
    OptionsParse {
        /// Parser message
        reason: String,
    },
}

impl From<serde_json::Error> for TexFrameError {
    fn from(err: serde_json::Error) -> Self {
        TexFrameError::OptionsParse {
            reason: err.to_string(),
        }
    }
}
