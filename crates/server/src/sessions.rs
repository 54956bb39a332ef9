//! Installed-app session store.
//!
//! The OAuth callback writes one session per shop; the quiz-results flow
//! only reads. The store is an explicit value injected through the
//! application state rather than ambient global state, and the platform
//! remains the sole source of truth for everything else - losing this
//! process only means re-installing the app.

use std::collections::HashMap;

use quiz_bridge_core::ShopDomain;
use secrecy::SecretString;
use tokio::sync::RwLock;

/// The result of completing the OAuth handshake for a shop.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopSession {
    /// Shop the token was granted for.
    pub shop: ShopDomain,
    /// Admin API access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// In-process shop-to-session map.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<ShopDomain, ShopSession>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for a shop, if the app is installed there.
    pub async fn get(&self, shop: &ShopDomain) -> Option<ShopSession> {
        self.inner.read().await.get(shop).cloned()
    }

    /// Store (or replace) the session for its shop.
    pub async fn put(&self, session: ShopSession) {
        self.inner
            .write()
            .await
            .insert(session.shop.clone(), session);
    }

    /// Whether a session exists for the shop.
    pub async fn contains(&self, shop: &ShopDomain) -> bool {
        self.inner.read().await.contains_key(shop)
    }
}
