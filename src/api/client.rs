//! Marketo API client implementation.
//!
//! This module provides the main client for the Marketo REST API. It obtains
//! an access token at construction, signs every resource call with it and
//! classifies responses. Resource-specific calls live in
//! [`resources`](super::resources) and only depend on the [`Requester`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::credentials::Credentials;
use super::envelope::{decode, RawPayload};
use super::error::{ApiError, Result};
use super::pager::{cursor_from_envelope, paging_token_path, PagingCursor};
use super::signer::{EndpointKind, RequestBody, Signer};
use super::token::{AccessToken, TokenManager};
use super::transport::Transport;

/// The raw-bytes contract resource calls are built on.
///
/// Implemented by [`MarketoClient`]; tests substitute an in-memory fake.
#[async_trait]
pub trait Requester: Send + Sync {
    /// `GET` a path relative to the REST base and return the raw body.
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// `POST` a body to a path relative to the REST base and return the raw body.
    async fn post(&self, path: &str, body: RequestBody) -> Result<Vec<u8>>;
}

/// The Marketo API client.
///
/// Safe to share between tasks behind an `Arc`. The access token is refreshed
/// only at construction and when [`MarketoClient::refresh_token`] is called.
#[derive(Debug)]
pub struct MarketoClient {
    credentials: Arc<Credentials>,
    transport: Transport,
    tokens: TokenManager,
}

impl MarketoClient {
    /// Create a client and obtain its first access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial token request fails. No client is
    /// returned in that case.
    pub async fn new(credentials: Credentials) -> Result<Self> {
        Self::with_http_client(credentials, Client::new()).await
    }

    /// Create a client on top of a preconfigured HTTP client.
    ///
    /// Use this to add timeouts, proxies or TLS settings; the client itself
    /// adds none.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial token request fails.
    #[instrument(skip_all, fields(client_id = %credentials.client_id()))]
    pub async fn with_http_client(credentials: Credentials, http: Client) -> Result<Self> {
        info!(api_base = %credentials.api_base_url(), "Creating Marketo client");

        let credentials = Arc::new(credentials);
        let transport = Transport::new(http);
        let tokens = TokenManager::new(Arc::clone(&credentials), transport.clone()).await?;

        info!("Marketo client created");
        Ok(Self {
            credentials,
            transport,
            tokens,
        })
    }

    /// Request a new access token, replacing the current one on success.
    ///
    /// Calls already in flight keep using the token they started with.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity endpoint rejects the credentials or
    /// cannot be reached; the previous token remains in use.
    pub async fn refresh_token(&self) -> Result<()> {
        self.tokens.refresh().await
    }

    /// A snapshot of the current access token.
    pub async fn token(&self) -> Arc<AccessToken> {
        self.tokens.current().await
    }

    /// The credentials this client was built with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Obtain a paging cursor anchored at `since`.
    ///
    /// The timestamp is validated before any request is sent.
    ///
    /// # Errors
    ///
    /// - `ApiError::InvalidInput` for an unparseable timestamp
    /// - transport, decode or API errors from the paging-token call
    #[instrument(skip(self))]
    pub async fn paging_cursor(&self, since: &str) -> Result<PagingCursor> {
        get_paging_cursor(self, since).await
    }

    /// `GET` with a caller-supplied cancellation signal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Cancelled` if `cancel` fires before the response
    /// arrives, otherwise the same errors as [`Requester::get`].
    pub async fn get_cancellable(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.send(Method::GET, path, None) => result,
        }
    }

    /// `POST` with a caller-supplied cancellation signal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Cancelled` if `cancel` fires before the response
    /// arrives, otherwise the same errors as [`Requester::post`].
    pub async fn post_cancellable(
        &self,
        path: &str,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.send(Method::POST, path, Some(body)) => result,
        }
    }

    /// Sign and execute a resource call.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    async fn send(&self, method: Method, path: &str, body: Option<RequestBody>) -> Result<Vec<u8>> {
        // Snapshot before building; a concurrent refresh won't touch this request.
        let token = self.tokens.current().await;

        let url = EndpointKind::Resource.url(&self.credentials, path);
        let mut request = Signer::Token(&token).sign(self.transport.http().request(method, url));
        if let Some(body) = body {
            debug!(content_type = body.content_type(), "Attaching request body");
            request = body.apply(request);
        }

        self.transport.execute(request).await
    }
}

#[async_trait]
impl Requester for MarketoClient {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<Vec<u8>> {
        self.send(Method::POST, path, Some(body)).await
    }
}

/// Request a paging cursor through any [`Requester`].
///
/// # Errors
///
/// See [`MarketoClient::paging_cursor`].
pub async fn get_paging_cursor<R: Requester + ?Sized>(req: &R, since: &str) -> Result<PagingCursor> {
    let path = paging_token_path(since)?;
    debug!("Get: {}", path);

    let body = req.get(&path).await?;
    let envelope = decode::<RawPayload>(&body)?;
    cursor_from_envelope(envelope)
}
