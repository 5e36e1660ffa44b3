//! Access token ownership and refresh.
//!
//! The [`TokenManager`] is the only writer of the access token. Readers get an
//! `Arc` snapshot, so a refresh swaps the whole token and never mutates one a
//! caller is already holding.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::credentials::Credentials;
use super::error::{ApiError, Result};
use super::signer::{EndpointKind, Signer};
use super::transport::Transport;

/// Path of the token issuance endpoint, relative to the identity base.
const TOKEN_PATH: &str = "oauth/token";

/// Identity answers that mean the credentials themselves were refused.
const REJECTION_STATUSES: &[u16] = &[400, 401, 403];

/// Scheme used when the server omits `token_type`.
const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// Token issuance response body.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    scope: String,
}

/// An issued access token and its metadata.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    token_type: String,
    expires_in_seconds: u64,
    scope: String,
    issued_at: Instant,
}

impl AccessToken {
    /// Create a token issued now.
    pub fn new(value: &str, token_type: &str, expires_in_seconds: u64, scope: &str) -> Self {
        Self {
            value: value.to_string(),
            token_type: token_type.to_string(),
            expires_in_seconds,
            scope: scope.to_string(),
            issued_at: Instant::now(),
        }
    }

    /// Decode a token issuance response body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` for malformed bodies and
    /// `ApiError::InvalidResponse` when the token value is empty.
    pub fn from_response(body: &[u8]) -> Result<Self> {
        let response: TokenResponse = serde_json::from_slice(body)?;
        if response.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "token response has an empty access_token".to_string(),
            ));
        }

        let token_type = if response.token_type.is_empty() {
            DEFAULT_TOKEN_TYPE
        } else {
            &response.token_type
        };

        Ok(Self::new(
            &response.access_token,
            token_type,
            response.expires_in,
            &response.scope,
        ))
    }

    /// The raw token value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The token type as declared by the server (e.g. "bearer").
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Lifetime in seconds as reported at issuance.
    pub fn expires_in_seconds(&self) -> u64 {
        self.expires_in_seconds
    }

    /// The scope the token was issued for.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// When this token was received.
    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// Time left before the server-reported expiry.
    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.expires_in_seconds).saturating_sub(self.issued_at.elapsed())
    }

    /// Whether the token expires within `margin` from now.
    ///
    /// Nothing in the client calls this; refresh policy is left to the caller.
    pub fn is_expired(&self, margin: Duration) -> bool {
        self.remaining() <= margin
    }

    /// The `Authorization` header value, e.g. `Bearer abc123`.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", capitalize_scheme(&self.token_type), self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Normalize a token type to its capitalized scheme name (`bearer` -> `Bearer`).
fn capitalize_scheme(token_type: &str) -> String {
    let mut chars = token_type.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => "Bearer".to_string(),
    }
}

/// Owns the current access token.
#[derive(Debug)]
pub struct TokenManager {
    credentials: Arc<Credentials>,
    transport: Transport,
    current: RwLock<Arc<AccessToken>>,
}

impl TokenManager {
    /// Create a token manager and perform the initial refresh.
    ///
    /// # Errors
    ///
    /// Fails if the first token cannot be obtained; no manager is returned.
    pub async fn new(credentials: Arc<Credentials>, transport: Transport) -> Result<Self> {
        let token = fetch_token(&credentials, &transport).await?;
        Ok(Self {
            credentials,
            transport,
            current: RwLock::new(Arc::new(token)),
        })
    }

    /// Request a new token and replace the current one.
    ///
    /// On failure the existing token stays in place.
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` if the identity endpoint could not be reached
    /// - `ApiError::CredentialsRejected` for a 400, 401 or 403 answer
    /// - `ApiError::Transport` for any other non-200 answer
    /// - `ApiError::Decode` / `ApiError::InvalidResponse` for unusable bodies
    #[instrument(skip(self), fields(client_id = %self.credentials.client_id()))]
    pub async fn refresh(&self) -> Result<()> {
        let token = fetch_token(&self.credentials, &self.transport)
            .await
            .map_err(|e| {
                warn!("Token refresh failed: {}", e);
                e
            })?;

        *self.current.write().await = Arc::new(token);
        debug!("Access token replaced");
        Ok(())
    }

    /// A consistent snapshot of the current token.
    pub async fn current(&self) -> Arc<AccessToken> {
        Arc::clone(&*self.current.read().await)
    }
}

/// Perform one client-credentials token request.
async fn fetch_token(credentials: &Credentials, transport: &Transport) -> Result<AccessToken> {
    let url = EndpointKind::Identity.url(credentials, TOKEN_PATH);
    let request = Signer::ClientCredentials(credentials).sign(
        transport
            .http()
            .get(url)
            .query(&[("grant_type", "client_credentials")]),
    );

    let body = transport.execute(request).await.map_err(|e| match e {
        ApiError::Transport { status, body } if REJECTION_STATUSES.contains(&status) => {
            ApiError::CredentialsRejected { status, body }
        }
        other => other,
    })?;

    let token = AccessToken::from_response(&body)?;
    info!(
        token_type = %token.token_type(),
        expires_in = token.expires_in_seconds(),
        "Obtained access token"
    );
    Ok(token)
}
