//! Shopify Admin API client.
//!
//! # Architecture
//!
//! - Raw GraphQL documents as `const` strings with inline serde response
//!   structs - three operations (customer lookup, update, create) do not
//!   warrant schema codegen
//! - Shopify is source of truth - no local copy, no caching, every request
//!   re-queries the platform
//! - One write call per submission (update or create, never both), no
//!   retries; a failed call surfaces to the caller as-is

mod client;
pub mod types;

pub use client::{AccessTokenGrant, AdminClient};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response envelope arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success HTTP status.
    ///
    /// Kept separate from [`ShopifyError::Http`] so callers can forward the
    /// original status and body verbatim instead of collapsing it into a
    /// generic upstream failure. A `429` or `401` from Shopify lands here.
    #[error("upstream status {status}: {body}")]
    Status {
        /// HTTP status code returned by the platform.
        status: u16,
        /// Raw response body, forwarded untouched.
        body: String,
    },

    /// The response envelope carried top-level GraphQL errors.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),

    /// A mutation returned structured `userErrors`.
    ///
    /// Carries the first error's message; the platform orders them by field.
    #[error("User error: {0}")]
    UserError(String),

    /// OAuth token exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
