//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QUIZ_BRIDGE_BASE_URL` - Public URL for the service (OAuth redirect base)
//! - `SHOPIFY_API_KEY` - App API key (OAuth client ID)
//! - `SHOPIFY_API_SECRET` - App API secret (OAuth client secret, HMAC key)
//! - `SHOPIFY_API_SCOPES` - Comma-separated access scopes to request
//! - `SHOPIFY_SHOP` - Shop domain this deployment serves
//!   (e.g., your-store.myshopify.com)
//!
//! ## Optional
//! - `QUIZ_BRIDGE_HOST` - Bind address (default: 127.0.0.1)
//! - `QUIZ_BRIDGE_PORT` - Listen port (default: 9000)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2026-01)
//! - `SHOPIFY_ACCESS_TOKEN` - Static Admin API token; pre-seeds the session
//!   store so the quiz endpoint works without running the OAuth flow
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use quiz_bridge_core::ShopDomain;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the service
    pub base_url: String,
    /// Shopify app configuration
    pub shopify: ShopifyConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// App API key (OAuth client ID)
    pub api_key: String,
    /// App API secret (OAuth client secret, also the HMAC key)
    pub api_secret: SecretString,
    /// Access scopes requested during installation
    pub scopes: Vec<String>,
    /// Admin API version (e.g., 2026-01)
    pub api_version: String,
    /// The shop this deployment serves
    pub shop: ShopDomain,
    /// Static Admin API access token (seeds the session store at startup)
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .field("shop", &self.shop)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("QUIZ_BRIDGE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("QUIZ_BRIDGE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("QUIZ_BRIDGE_PORT", "9000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("QUIZ_BRIDGE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("QUIZ_BRIDGE_BASE_URL")?;

        let shopify = ShopifyConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let shop = get_required_env("SHOPIFY_SHOP")?;
        let shop = ShopDomain::parse(&shop)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPIFY_SHOP".to_string(), e.to_string()))?;

        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_required_secret("SHOPIFY_API_SECRET")?,
            scopes: parse_scopes(&get_required_env("SHOPIFY_API_SCOPES")?),
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2026-01"),
            shop,
            access_token: get_optional_env("SHOPIFY_ACCESS_TOKEN").map(SecretString::from),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Split a comma-separated scope list, trimming whitespace and empty entries.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
