//! API error types for the Marketo client.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structured error reported by the API inside a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// The Marketo error code (e.g. "601", "1003").
    pub code: String,
    /// Human readable description of the fault.
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Errors that can occur when interacting with the Marketo API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed host or credentials supplied at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Network or HTTP error before a status was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a status other than 200.
    #[error("Received unexpected status {status}: {body}")]
    Transport {
        /// The HTTP status code.
        status: u16,
        /// The raw, unparsed response body.
        body: String,
    },

    /// The identity endpoint refused to issue a token.
    #[error("Credentials rejected (HTTP {status}): {body}")]
    CredentialsRejected {
        /// The HTTP status code.
        status: u16,
        /// The raw, unparsed response body.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response decoded but is missing something the call needs.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The API accepted the request but reported `success: false`.
    #[error("API rejected the request: {}", format_details(.0))]
    Api(Vec<ApiErrorDetail>),

    /// Caller-supplied input was rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The call was cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// Keyring error when storing/retrieving client secrets.
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

fn format_details(details: &[ApiErrorDetail]) -> String {
    if details.is_empty() {
        return "no error details provided".to_string();
    }
    details
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApiError {
    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } | ApiError::CredentialsRejected { status, .. } => {
                Some(*status)
            }
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The structured API error list, if the server reported one.
    pub fn details(&self) -> &[ApiErrorDetail] {
        match self {
            ApiError::Api(details) => details,
            _ => &[],
        }
    }

    /// Whether the error was produced by the HTTP/network layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Transport { .. } | ApiError::CredentialsRejected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(code: &str, message: &str) -> ApiErrorDetail {
        ApiErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_transport_error_display_keeps_body() {
        let err = ApiError::Transport {
            status: 500,
            body: r#"{"error":"boom"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"Received unexpected status 500: {"error":"boom"}"#
        );
        assert_eq!(err.status(), Some(500));
        assert!(err.is_transport());
    }

    #[test]
    fn test_api_error_display_lists_details() {
        let err = ApiError::Api(vec![detail("1003", "rate limit"), detail("601", "bad token")]);
        assert_eq!(
            err.to_string(),
            "API rejected the request: [1003] rate limit, [601] bad token"
        );
        assert_eq!(err.details().len(), 2);
        assert!(!err.is_transport());
    }

    #[test]
    fn test_api_error_without_details() {
        let err = ApiError::Api(Vec::new());
        assert!(err.to_string().contains("no error details"));
    }

    #[test]
    fn test_decode_error_is_not_transport() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ApiError = json_err.into();
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(!err.is_transport());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_credentials_rejected_status() {
        let err = ApiError::CredentialsRejected {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("HTTP 401"));
    }
}
