//! Request signing.
//!
//! Marketo uses two authentication schemes: the identity endpoint takes the
//! client credentials as query parameters, while every REST resource expects an
//! `Authorization` header carrying the access token. The scheme is chosen by
//! [`EndpointKind`], never by inspecting URLs.

use reqwest::{header, RequestBuilder};

use super::credentials::Credentials;
use super::token::AccessToken;

/// The endpoint family a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Token issuance under `/identity/`.
    Identity,
    /// REST resources under `/rest/v1/`.
    Resource,
}

impl EndpointKind {
    /// Join a relative path onto the base URL for this endpoint family.
    ///
    /// A leading `/` on `path` is ignored so both `"leads.json"` and
    /// `"/leads.json"` resolve to the same URL.
    pub fn url(self, credentials: &Credentials, path: &str) -> String {
        let base = match self {
            EndpointKind::Identity => credentials.identity_base_url(),
            EndpointKind::Resource => credentials.api_base_url(),
        };
        format!("{}{}", base, path.trim_start_matches('/'))
    }
}

/// Authentication material attached to an outbound request.
#[derive(Debug, Clone, Copy)]
pub enum Signer<'a> {
    /// Append `client_id` and `client_secret` as query parameters.
    ClientCredentials(&'a Credentials),
    /// Add an `Authorization: <Type> <token>` header.
    Token(&'a AccessToken),
}

impl Signer<'_> {
    /// Attach the authentication material to a request.
    pub fn sign(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Signer::ClientCredentials(credentials) => builder.query(&[
                ("client_id", credentials.client_id()),
                ("client_secret", credentials.client_secret()),
            ]),
            Signer::Token(token) => {
                builder.header(header::AUTHORIZATION, token.authorization_value())
            }
        }
    }
}

/// A POST body and the convention it is sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Raw JSON bytes, sent as `application/json`.
    Json(Vec<u8>),
    /// Key/value pairs, sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Serialize a value into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn json<T: serde::Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_vec(value).map(RequestBody::Json)
    }

    /// Build a form body from borrowed pairs.
    pub fn form<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The content type this body is sent with.
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Json(_) => "application/json",
            RequestBody::Form(_) => "application/x-www-form-urlencoded",
        }
    }

    /// Attach the body and its content type to a request.
    pub fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            RequestBody::Json(bytes) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(bytes),
            // `form` sets the urlencoded content type itself
            RequestBody::Form(pairs) => builder.form(&pairs),
        }
    }
}
