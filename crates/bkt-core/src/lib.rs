//! Core traits, types, and error handling for bkt.
//!
//! This crate provides the foundational abstractions shared by the
//! Bitbucket client and the layers built on top of it.

pub mod config;
pub mod context;
pub mod error;
pub mod provider;
pub mod types;

pub use context::{CancelHandle, Context};
pub use error::{Error, Result};
pub use provider::{PullRequestReader, PullRequestWriter};
pub use types::*;
