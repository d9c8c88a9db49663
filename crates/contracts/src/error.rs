//! Layered error definitions
//!
//! Categorized by source: config / endpoint / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Endpoint Errors =====
    /// The endpoint cannot hand out the requested handle
    #[error("endpoint '{endpoint}' cannot provide a {side} handle: {message}")]
    HandleUnavailable {
        endpoint: String,
        side: HandleSide,
        message: String,
    },

    /// Operation on a handle that was already closed
    #[error("handle '{endpoint}' is closed")]
    Closed { endpoint: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Which side of an endpoint an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleSide {
    Read,
    Write,
}

impl std::fmt::Display for HandleSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleSide::Read => f.write_str("read"),
            HandleSide::Write => f.write_str("write"),
        }
    }
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create handle-unavailable error
    pub fn handle_unavailable(
        endpoint: impl Into<String>,
        side: HandleSide,
        message: impl Into<String>,
    ) -> Self {
        Self::HandleUnavailable {
            endpoint: endpoint.into(),
            side,
            message: message.into(),
        }
    }

    /// Create closed-handle error
    pub fn closed(endpoint: impl Into<String>) -> Self {
        Self::Closed {
            endpoint: endpoint.into(),
        }
    }

    /// Whether this error reports a handle that was already closed
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_unavailable_message() {
        let err = ContractError::handle_unavailable("pipe", HandleSide::Write, "write end taken");
        assert_eq!(
            err.to_string(),
            "endpoint 'pipe' cannot provide a write handle: write end taken"
        );
    }

    #[test]
    fn test_is_closed() {
        assert!(ContractError::closed("stdout").is_closed());
        assert!(!ContractError::Other("x".into()).is_closed());
    }
}
