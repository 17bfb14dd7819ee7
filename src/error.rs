//! Error types for fnship
//!
//! This module defines the error taxonomy shared by the deploy planner,
//! the runtime config store, and the remote API clients, using `thiserror`
//! for ergonomic error handling.

use thiserror::Error;

/// Main error type for fnship operations
///
/// Declaration, filter, and argument errors are raised before any remote
/// call is made. Remote errors abort the current operation without retry
/// and without rolling back writes that already succeeded.
#[derive(Error, Debug)]
pub enum FnshipError {
    /// A function or group key in the declaration tree is invalid
    #[error("Declaration error: {0}")]
    Declaration(String),

    /// Mutually exclusive options were supplied, or the reserved namespace was targeted
    #[error("{0}")]
    FilterConflict(String),

    /// Every supplied filter failed to match a declared or deployed function
    #[error(
        "the following filters were specified but do not match any functions in the project: {}",
        .0.join(", ")
    )]
    UnmatchedFilters(Vec<String>),

    /// Malformed user input (set arguments, resource names)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Remote resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response from a remote API
    #[error("Remote operation failed ({status}): {message}")]
    Remote {
        /// HTTP status code returned by the API
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Declaration manifest could not be read or understood
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FnshipError {
    /// Returns true if `err` wraps a [`FnshipError::NotFound`]
    ///
    /// # Examples
    ///
    /// ```
    /// use fnship::error::FnshipError;
    ///
    /// let err: anyhow::Error = FnshipError::NotFound("configs/foo".to_string()).into();
    /// assert!(FnshipError::is_not_found(&err));
    /// ```
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<FnshipError>(), Some(FnshipError::NotFound(_)))
    }

    /// Returns the HTTP status carried by a remote failure, if any
    pub fn remote_status(err: &anyhow::Error) -> Option<u16> {
        match err.downcast_ref::<FnshipError>() {
            Some(FnshipError::Remote { status, .. }) => Some(*status),
            Some(FnshipError::NotFound(_)) => Some(404),
            _ => None,
        }
    }
}

/// Result type alias for fnship operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_error_display() {
        let error = FnshipError::Declaration("bad-name".to_string());
        assert_eq!(error.to_string(), "Declaration error: bad-name");
    }

    #[test]
    fn test_unmatched_filters_display() {
        let error = FnshipError::UnmatchedFilters(vec!["foo".to_string(), "bar.baz".to_string()]);
        assert_eq!(
            error.to_string(),
            "the following filters were specified but do not match any functions in the project: foo, bar.baz"
        );
    }

    #[test]
    fn test_remote_error_display() {
        let error = FnshipError::Remote {
            status: 503,
            message: "backend unavailable".to_string(),
        };
        assert!(error.to_string().contains("503"));
        assert!(error.to_string().contains("backend unavailable"));
    }

    #[test]
    fn test_is_not_found_downcasts() {
        let not_found: anyhow::Error = FnshipError::NotFound("x".to_string()).into();
        let remote: anyhow::Error = FnshipError::Remote {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        let other = anyhow::anyhow!("plain error");

        assert!(FnshipError::is_not_found(&not_found));
        assert!(!FnshipError::is_not_found(&remote));
        assert!(!FnshipError::is_not_found(&other));
    }

    #[test]
    fn test_remote_status() {
        let remote: anyhow::Error = FnshipError::Remote {
            status: 503,
            message: "x".to_string(),
        }
        .into();
        let not_found: anyhow::Error = FnshipError::NotFound("x".to_string()).into();

        assert_eq!(FnshipError::remote_status(&remote), Some(503));
        assert_eq!(FnshipError::remote_status(&not_found), Some(404));
        assert_eq!(FnshipError::remote_status(&anyhow::anyhow!("x")), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: FnshipError = io_error.into();
        assert!(matches!(error, FnshipError::Io(_)));
    }
}
