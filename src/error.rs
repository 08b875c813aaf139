/// Error types for the tagging tool
///
/// None of these are fatal to the session: every failure path hands control
/// back to the operator with a message. A duplicate VIN is not an error at
/// all; it is a distinct rename outcome routed to duplicate resolution.

use thiserror::Error;

/// Malformed VIN input, caught locally before anything reaches the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter the last 6 characters of the VIN")]
    Empty,

    #[error("VIN must be exactly 6 alphanumeric characters")]
    Malformed,
}

/// Failure of a backend exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network failure or non-success HTTP status (retryable)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be parsed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Explicit `success: false` from the backend, message shown verbatim
    #[error("{message}")]
    Backend { message: String },
}

impl ApiError {
    /// Text shown to the operator. Transport and decode failures collapse
    /// into the caller's generic retry message.
    pub fn operator_message(&self, generic: &str) -> String {
        match self {
            ApiError::Backend { message } => message.clone(),
            ApiError::Transport(_) | ApiError::Decode(_) => generic.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Configuration file problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
