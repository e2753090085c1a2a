//! Bitbucket Cloud provider implementation for bkt.
//!
//! This crate provides the HTTP transport, cursor pagination and the pull
//! request read/write operations against the Bitbucket Cloud REST API v2.

mod client;
pub mod pagination;
mod transport;
mod types;

pub use client::BitbucketClient;
pub use transport::{ApiRequest, ClientOptions, Credentials, HttpTransport, NO_BODY};
pub use types::*;

pub use bkt_core::config::DEFAULT_BITBUCKET_URL;
