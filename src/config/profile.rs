//! Marketo instance profile configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::api::{self, Credentials};

/// A Marketo instance profile.
///
/// Profiles store connection details for one Marketo instance. The client
/// secret may be kept in the OS keyring instead of the file.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// The name of this profile.
    ///
    /// Must be non-empty and unique across all profiles.
    pub name: String,

    /// The instance host, e.g. "123-ABC-456.mktorest.com".
    pub host: String,

    /// The OAuth client id of the custom service.
    pub client_id: String,

    /// The OAuth client secret, when not stored in the keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Profile {
    /// Create a new profile whose secret lives in the keyring.
    pub fn new(name: String, host: String, client_id: String) -> Self {
        Self {
            name,
            host,
            client_id,
            client_secret: None,
        }
    }

    /// Validate this profile.
    ///
    /// Checks that:
    /// - The name is non-empty and has no whitespace
    /// - The host is non-empty and has no whitespace
    /// - The client id is non-empty
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': host cannot be empty",
                self.name
            )));
        }

        if self.host.trim().contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': host cannot contain whitespace",
                self.name
            )));
        }

        if self.client_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': client_id cannot be empty",
                self.name
            )));
        }

        Ok(())
    }

    /// Build API credentials for this profile.
    ///
    /// Uses the inline secret when present, otherwise the OS keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret cannot be found or the credentials are invalid.
    pub fn credentials(&self) -> api::error::Result<Credentials> {
        match self.client_secret.as_deref() {
            Some(secret) => Credentials::new(&self.client_id, secret, &self.host),
            None => Credentials::from_keyring(&self.name, &self.client_id, &self.host),
        }
    }
}
