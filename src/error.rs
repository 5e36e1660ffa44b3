//! Centralized error types for marketo-client.
//!
//! This module provides the application-level error hierarchy with
//! user-friendly messages on top of the API and configuration errors.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// IO errors (stdin, file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file exists and is readable.".to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
            },
            AppError::Api(e) => match e {
                ApiError::InvalidConfig(msg) => format!("Invalid instance settings: {}", msg),
                ApiError::Network(_) => {
                    "Connection failed. Please check your network and instance host.".to_string()
                }
                ApiError::Transport { status, .. } => {
                    format!("Marketo answered with HTTP {}.", status)
                }
                ApiError::CredentialsRejected { .. } => {
                    "Authentication failed. Please check your client id and secret.".to_string()
                }
                ApiError::Decode(_) | ApiError::InvalidResponse(_) => {
                    "Unexpected response from Marketo. Please try again.".to_string()
                }
                ApiError::Api(details) => match details.first() {
                    Some(first) => format!("Marketo rejected the request: {}", first),
                    None => "Marketo rejected the request.".to_string(),
                },
                ApiError::InvalidInput(msg) => format!("Invalid input: {}", msg),
                ApiError::Cancelled => "The request was cancelled.".to_string(),
                ApiError::Keyring(_) => {
                    "Could not access secure storage. Please store the client secret again."
                        .to_string()
                }
            },
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Check if this error is recoverable by trying again later.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Api(ApiError::Network(_)) | AppError::Api(ApiError::Cancelled) => true,
            AppError::Api(ApiError::Transport { status, .. }) => *status >= 500 || *status == 429,
            // 606 rate limit, 615 concurrency limit, 1029 export queue full
            AppError::Api(ApiError::Api(details)) => details
                .iter()
                .any(|d| matches!(d.code.as_str(), "606" | "615" | "1029")),
            _ => false,
        }
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::NoConfigDir) | AppError::Config(ConfigError::ReadError(_)) => {
                Some("Create a config file or point MARKETO_CLIENT_CONFIG at one.")
            }
            AppError::Api(ApiError::CredentialsRejected { .. }) => {
                Some("Check the custom service credentials under Admin > LaunchPoint.")
            }
            AppError::Api(ApiError::Keyring(_)) => Some("Run 'mkto set-secret' for this profile."),
            AppError::Api(ApiError::Network(_)) => {
                Some("Check your internet connection and the instance host.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
