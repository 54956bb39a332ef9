//! Quiz Bridge server library.
//!
//! This crate provides the bridge functionality as a library, allowing it
//! to be tested and reused.
//!
//! # Architecture
//!
//! - Axum web framework, one async task per request
//! - Shopify Admin GraphQL API is the sole source of truth - no local
//!   persistence, no caching, every request re-queries the platform
//! - OAuth app installation populates an in-process session store; the
//!   quiz-results flow only reads from it

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod sessions;
pub mod shopify;
pub mod state;
