//! Unified error types for the Rollbar CLI

use thiserror::Error;

/// Unified error type for all Rollbar operations
#[derive(Error, Debug)]
pub enum RollbarError {
    // API errors
    #[error("rollbar API error: {message} (status: {status}, err: {code})")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Input errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl RollbarError {
    /// HTTP status carried by an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }

    /// True for 401/403 responses
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// True for 404 responses
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for 429 responses
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

/// Result type alias using RollbarError
pub type Result<T> = std::result::Result<T, RollbarError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> RollbarError {
        RollbarError::Api {
            status,
            code: 1,
            message: "nope".to_string(),
        }
    }

    #[test]
    fn test_status_predicates() {
        assert!(api(401).is_auth_error());
        assert!(api(403).is_auth_error());
        assert!(!api(404).is_auth_error());
        assert!(api(404).is_not_found());
        assert!(api(429).is_rate_limited());
        assert!(RollbarError::RateLimited("slow down".into()).is_rate_limited());
        assert!(!RollbarError::Other("x".into()).is_not_found());
    }

    #[test]
    fn test_api_error_message() {
        let msg = api(401).to_string();
        assert_eq!(msg, "rollbar API error: nope (status: 401, err: 1)");
    }
}
