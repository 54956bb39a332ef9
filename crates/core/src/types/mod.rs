//! Core domain types.
//!
//! Newtype wrappers that make invalid states unrepresentable at module
//! boundaries: shop domains are sanitized before they reach a redirect,
//! emails are structurally checked before they reach a query, and Shopify
//! global IDs cannot be mixed up with one another.

mod email;
mod gid;
mod shop;

pub use email::{Email, EmailError};
pub use gid::{CustomerId, MetafieldId};
pub use shop::{ShopDomain, ShopDomainError};
