// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for Swizzle
//!
//! Transport misuse, HTTP failures and rejected transforms all land here.
//! Listener callbacks are the exception: they return `anyhow::Result` so user
//! code can bubble up any error type, and the dispatcher reports those instead
//! of propagating them.

use thiserror::Error;

/// Result type alias for Swizzle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Swizzle
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Transport used out of order (send before open, send twice, ...)
    #[error("Invalid state: {operation} not allowed while {state}")]
    InvalidState {
        operation: String,
        state: String,
    },

    /// A response transform rejected
    #[error("Transform rejected: {0}")]
    Transform(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid state error
    pub fn invalid_state(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Error::InvalidState {
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Create a transform rejection
    pub fn transform<S: Into<String>>(msg: S) -> Self {
        Error::Transform(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if the transport was driven out of order
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState { .. })
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_error() {
        let err = Error::invalid_state("send", "UNSENT");

        assert!(err.is_invalid_state());
        assert_eq!(err.to_string(), "Invalid state: send not allowed while UNSENT");
    }

    #[test]
    fn test_string_conversion() {
        let err: Error = "no runtime".into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "no runtime"));
        assert!(!err.is_invalid_state());
    }

    #[test]
    fn test_transform_error() {
        let err = Error::transform("upstream lookup failed");
        assert_eq!(err.to_string(), "Transform rejected: upstream lookup failed");
    }
}
