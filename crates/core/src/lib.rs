//! Quiz Bridge Core - Shared types library.
//!
//! This crate provides common types used across the Quiz Bridge components:
//! - `server` - The web service bridging quiz submissions to Shopify
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe shop domains, emails, and
//!   Shopify global IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
