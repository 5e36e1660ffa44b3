//! Client credentials and endpoint derivation.
//!
//! A Marketo instance is addressed by a single host (e.g.
//! `123-ABC-456.mktorest.com`). Both the REST base and the identity base are
//! derived from it. Client secrets can be kept in the OS keyring instead of
//! the configuration file.

use std::fmt;

use super::error::{ApiError, Result};

/// The keyring service name for stored client secrets.
const KEYRING_SERVICE: &str = "marketo-client";

/// REST API version segment.
const API_VERSION: &str = "v1";

/// Immutable credentials for one Marketo instance.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    api_base_url: String,
    identity_base_url: String,
}

impl Credentials {
    /// Build credentials from a client id, secret and host.
    ///
    /// The host may carry an `http://` or `https://` scheme; `https://` is
    /// assumed otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if any input is empty or the host
    /// contains whitespace.
    pub fn new(client_id: &str, client_secret: &str, host: &str) -> Result<Self> {
        if client_id.trim().is_empty() {
            return Err(ApiError::InvalidConfig("client id cannot be empty".to_string()));
        }
        if client_secret.trim().is_empty() {
            return Err(ApiError::InvalidConfig(
                "client secret cannot be empty".to_string(),
            ));
        }

        let root = normalize_host(host)?;

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            api_base_url: format!("{}/rest/{}/", root, API_VERSION),
            identity_base_url: format!("{}/identity/", root),
        })
    }

    /// Build credentials using a client secret stored in the OS keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret cannot be retrieved or the inputs are invalid.
    pub fn from_keyring(profile_name: &str, client_id: &str, host: &str) -> Result<Self> {
        let secret = get_secret(profile_name)?;
        Self::new(client_id, &secret, host)
    }

    /// The OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Base URL for resource calls, e.g. `https://host/rest/v1/`.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Base URL for token issuance, e.g. `https://host/identity/`.
    pub fn identity_base_url(&self) -> &str {
        &self.identity_base_url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("identity_base_url", &self.identity_base_url)
            .finish()
    }
}

/// Schemes a configured host may carry, matched case-insensitively.
const SCHEMES: &[&str] = &["https", "http"];

/// Turn a configured host into a scheme-qualified root without trailing slashes.
fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim();

    if host.is_empty() {
        return Err(ApiError::InvalidConfig("host cannot be empty".to_string()));
    }
    if host.contains(char::is_whitespace) {
        return Err(ApiError::InvalidConfig(format!(
            "host '{}' cannot contain whitespace",
            host
        )));
    }

    let (scheme, name) = split_scheme(host);
    let name = name.trim_end_matches('/');
    if name.is_empty() {
        return Err(ApiError::InvalidConfig(format!("host '{}' has no name", host)));
    }

    Ok(format!("{}://{}", scheme, name))
}

/// Split off a leading `http://` or `https://`, defaulting to `https`.
fn split_scheme(host: &str) -> (&'static str, &str) {
    for &scheme in SCHEMES {
        let prefix_len = scheme.len() + "://".len();
        let matches = host
            .get(..prefix_len)
            .and_then(|prefix| prefix.strip_suffix("://"))
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme));
        if matches {
            return (scheme, &host[prefix_len..]);
        }
    }
    ("https", host)
}

/// Store a client secret in the OS keyring.
///
/// # Errors
///
/// Returns an error if the secret cannot be stored in the keyring.
pub fn store_secret(profile_name: &str, secret: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(secret)
        .map_err(|e| ApiError::Keyring(format!("failed to store secret: {}", e)))?;

    Ok(())
}

/// Retrieve a client secret from the OS keyring.
///
/// # Errors
///
/// Returns an error if the secret cannot be retrieved from the keyring.
pub fn get_secret(profile_name: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve secret: {}", e)))
}

/// Delete a client secret from the OS keyring.
///
/// # Errors
///
/// Returns an error if the secret cannot be deleted from the keyring.
pub fn delete_secret(profile_name: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .delete_password()
        .map_err(|e| ApiError::Keyring(format!("failed to delete secret: {}", e)))
}
