//! Marketo API client and types.
//!
//! This module provides the authenticated request pipeline for the Marketo
//! REST API: credentials, token management, request signing, transport,
//! envelope decoding and activity paging, plus the resource calls built on top.

mod client;
mod credentials;
mod envelope;
pub mod error;
mod pager;
pub mod resources;
mod signer;
mod token;
mod transport;
pub mod types;

pub use client::{get_paging_cursor, MarketoClient, Requester};
pub use credentials::{delete_secret, get_secret, store_secret, Credentials};
pub use envelope::{decode, ApiEnvelope, RawPayload};
pub use error::{ApiError, ApiErrorDetail};
pub use pager::{normalize_since, normalize_since_in, Pager, PagingCursor};
pub use signer::{EndpointKind, RequestBody, Signer};
pub use token::{AccessToken, TokenManager};
pub use transport::Transport;
