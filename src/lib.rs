//! marketo-client - An authenticated client for the Marketo REST API
//!
//! The [`api`] module holds the request pipeline (token management, request
//! signing, transport, envelope decoding and activity paging) and the resource
//! calls built on it. [`config`], [`error`] and [`logging`] support the `mkto`
//! command-line tool.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
