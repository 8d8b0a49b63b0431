//! Error types for the dashboard service

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors raised while configuring the service or talking to the database.
///
/// Only configuration and client construction errors stop the service.
/// Everything that happens on a live subscription is turned into a
/// connection status instead of being returned.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Missing or unparseable configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database URL could not be parsed or used as a base
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    /// HTTP client or request failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The database answered with a non-success status
    #[error("Unexpected response status: {0}")]
    Status(reqwest::StatusCode),

    /// The event stream ended or failed mid-way
    #[error("Stream closed: {0}")]
    Stream(String),

    /// The server revoked access to the path, retrying cannot help
    #[error("Subscription cancelled: {0}")]
    Cancelled(String),

    /// An event payload was not valid JSON of the expected shape
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl DashboardError {
    /// Create a `Config` error for a variable holding a bad value
    #[must_use]
    pub fn invalid_var(name: &str, value: &str) -> Self {
        Self::Config(format!("{name} has invalid value '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashboardError::invalid_var("HISTORY_CAPACITY", "zero");
        assert_eq!(
            err.to_string(),
            "Configuration error: HISTORY_CAPACITY has invalid value 'zero'"
        );

        let err = DashboardError::Status(reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.to_string(),
            "Unexpected response status: 401 Unauthorized"
        );

        let err = DashboardError::Stream("connection closed by server".into());
        assert_eq!(err.to_string(), "Stream closed: connection closed by server");

        let err = DashboardError::Cancelled("auth_revoked".into());
        assert_eq!(err.to_string(), "Subscription cancelled: auth_revoked");
    }

    #[test]
    fn test_payload_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: DashboardError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid payload:"));
    }
}
