//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::sessions::SessionStore;
use crate::shopify::AdminClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the configuration, the
/// Admin API client, and the installed-app session store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    shopify: AdminClient,
    sessions: SessionStore,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let shopify = AdminClient::new(&config.shopify);
        Self::with_client(config, shopify)
    }

    /// Create a state with a pre-built Admin API client (used by tests to
    /// point the client at a mock server).
    #[must_use]
    pub fn with_client(config: AppConfig, shopify: AdminClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                sessions: SessionStore::new(),
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    /// Get a reference to the installed-app session store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }
}
