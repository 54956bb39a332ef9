//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input does not end with the platform suffix.
    #[error("shop domain must end with {suffix}")]
    InvalidSuffix {
        /// Required domain suffix.
        suffix: &'static str,
    },
    /// The store handle contains a character outside `[a-z0-9-]`.
    #[error("shop domain contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The store handle starts or ends with a hyphen.
    #[error("shop handle cannot start or end with a hyphen")]
    MisplacedHyphen,
}

/// A sanitized `*.myshopify.com` shop domain.
///
/// Every shop name arriving from the outside (query parameters, OAuth
/// callbacks) passes through [`ShopDomain::parse`] before it is used to
/// build a redirect or an API endpoint. An unchecked shop parameter would
/// let a request steer the OAuth flow to an arbitrary host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Required suffix for all shop domains.
    pub const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// Accepts either a full domain (`my-store.myshopify.com`) or a bare
    /// store handle (`my-store`); the latter has the suffix appended. Input
    /// is lowercased before validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, carries a non-platform domain
    /// suffix, or has a store handle outside `[a-z0-9-]` (hyphens may not
    /// lead or trail).
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let lower = s.trim().to_lowercase();
        if lower.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let handle = match lower.strip_suffix(Self::SUFFIX) {
            Some(handle) => handle,
            // A bare handle is fine; anything else with a dot is another domain.
            None if lower.contains('.') => {
                return Err(ShopDomainError::InvalidSuffix {
                    suffix: Self::SUFFIX,
                });
            }
            None => lower.as_str(),
        };

        if handle.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if let Some(bad) = handle
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(ShopDomainError::InvalidCharacter(bad));
        }

        if handle.starts_with('-') || handle.ends_with('-') {
            return Err(ShopDomainError::MisplacedHyphen);
        }

        Ok(Self(format!("{handle}{}", Self::SUFFIX)))
    }

    /// Returns the full domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store handle (the part before the suffix).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
