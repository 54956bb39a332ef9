//! App-installation OAuth route handlers.
//!
//! Handles the OAuth flow that installs the app on a shop:
//! - Entry: greets shops that already have a session, starts the install
//!   otherwise
//! - Begin: redirects to the shop's OAuth authorization page
//! - Callback: verifies the callback signature and state, exchanges the
//!   code for an access token, and stores the shop session

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use hmac::{Hmac, Mac};
use quiz_bridge_core::ShopDomain;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tower_sessions::Session;
use tracing::instrument;

use crate::sessions::ShopSession;
use crate::state::AppState;

const OAUTH_STATE_KEY: &str = "shopify_oauth_state";

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub shop: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BeginQuery {
    pub shop: Option<String>,
}

/// Query parameters from the Shopify OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub shop: Option<String>,
    pub hmac: Option<String>,
    pub timestamp: Option<String>,
    pub host: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            // SAFETY: idx is always within bounds since random_range returns 0..CHARSET.len()
            char::from(*CHARSET.get(idx).expect("idx within bounds"))
        })
        .collect()
}

type HmacSha256 = Hmac<Sha256>;

/// Verify the HMAC-SHA256 signature of the OAuth callback query.
///
/// The message is every returned parameter except `hmac` itself, sorted
/// alphabetically and joined as `key=value` pairs with `&`.
fn verify_callback_hmac(params: &CallbackQuery, api_secret: &SecretString) -> bool {
    let Some(provided_hmac) = &params.hmac else {
        return false;
    };

    let mut param_pairs: Vec<(&str, &str)> = Vec::new();
    if let Some(v) = &params.code {
        param_pairs.push(("code", v));
    }
    if let Some(v) = &params.host {
        param_pairs.push(("host", v));
    }
    if let Some(v) = &params.shop {
        param_pairs.push(("shop", v));
    }
    if let Some(v) = &params.state {
        param_pairs.push(("state", v));
    }
    if let Some(v) = &params.timestamp {
        param_pairs.push(("timestamp", v));
    }

    param_pairs.sort_by(|a, b| a.0.cmp(b.0));

    let message: String = param_pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Ok(mut mac) = HmacSha256::new_from_slice(api_secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());

    let computed = hex::encode(mac.finalize().into_bytes());
    computed == *provided_hmac
}

/// Resolve the shop from a query parameter, falling back to the configured
/// store. Rejects anything that does not sanitize to a platform domain.
fn resolve_shop(state: &AppState, param: Option<&str>) -> Result<ShopDomain, Response> {
    match param {
        Some(raw) => ShopDomain::parse(raw).map_err(|e| {
            tracing::warn!(shop = %raw, error = %e, "Rejected shop parameter");
            Redirect::to("/?error=invalid_shop").into_response()
        }),
        None => Ok(state.config().shopify.shop.clone()),
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// App entry point.
///
/// If the shop already has a session, greet; otherwise start the install
/// flow. Install errors redirect back here with an `error` query parameter.
///
/// # Route
///
/// `GET /`
#[instrument(skip(state))]
pub async fn entry(State(state): State<AppState>, Query(query): Query<EntryQuery>) -> Response {
    if let Some(error) = query.error {
        return format!("Installation failed: {error}").into_response();
    }

    let shop = match resolve_shop(&state, query.shop.as_deref()) {
        Ok(shop) => shop,
        Err(response) => return response,
    };

    if state.sessions().contains(&shop).await {
        format!("Quiz Bridge is installed for {shop}").into_response()
    } else {
        Redirect::to(&format!("/auth?shop={shop}")).into_response()
    }
}

/// Start the OAuth install flow.
///
/// Generates a CSRF state parameter, stores it in the cookie session, and
/// redirects to the shop's authorization page.
///
/// # Route
///
/// `GET /auth`
#[instrument(skip(state, session))]
pub async fn begin(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BeginQuery>,
) -> Response {
    let shop = match resolve_shop(&state, query.shop.as_deref()) {
        Ok(shop) => shop,
        Err(response) => return response,
    };

    let oauth_state = generate_random_string(32);

    if let Err(e) = session.insert(OAUTH_STATE_KEY, &oauth_state).await {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return Redirect::to("/?error=session").into_response();
    }

    let redirect_uri = format!("{}/auth/callback", state.config().base_url);

    let auth_url = state.shopify().authorization_url(
        &shop,
        &redirect_uri,
        &state.config().shopify.scopes,
        &oauth_state,
    );

    tracing::info!(shop = %shop, "Redirecting to Shopify OAuth");
    Redirect::to(&auth_url).into_response()
}

/// Handle the OAuth callback.
///
/// Verifies the HMAC signature and the state parameter, exchanges the
/// authorization code for an access token, and stores the shop session.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip(state, session))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackQuery>,
) -> Response {
    // Check for OAuth errors from Shopify
    if let Some(error) = &params.error {
        let description = params.error_description.as_deref().unwrap_or_default();
        tracing::warn!("Shopify OAuth error: {} - {}", error, description);
        return Redirect::to("/?error=oauth_denied").into_response();
    }

    // Verify the callback signature before trusting any parameter
    if !verify_callback_hmac(&params, &state.config().shopify.api_secret) {
        tracing::error!("Invalid HMAC signature in OAuth callback");
        return Redirect::to("/?error=oauth_invalid_hmac").into_response();
    }

    let Some(code) = &params.code else {
        tracing::warn!("OAuth callback missing code");
        return Redirect::to("/?error=oauth_missing_code").into_response();
    };

    // Verify state matches what we stored (CSRF protection)
    let Some(returned_state) = &params.state else {
        tracing::warn!("OAuth callback missing state");
        return Redirect::to("/?error=oauth_missing_state").into_response();
    };

    let stored_state: Option<String> = session.get(OAUTH_STATE_KEY).await.ok().flatten();
    if stored_state.as_ref() != Some(returned_state) {
        tracing::warn!("OAuth state mismatch");
        return Redirect::to("/?error=oauth_invalid_state").into_response();
    }

    // Clear the stored state (one-time use)
    let _ = session.remove::<String>(OAUTH_STATE_KEY).await;

    let shop = match resolve_shop(&state, params.shop.as_deref()) {
        Ok(shop) => shop,
        Err(response) => return response,
    };

    // Exchange code for an access token
    let grant = match state.shopify().exchange_code(&shop, code).await {
        Ok(grant) => grant,
        Err(e) => {
            tracing::error!("Failed to exchange OAuth code: {}", e);
            return Redirect::to("/?error=oauth_exchange_failed").into_response();
        }
    };

    let scopes: Vec<String> = grant
        .scope
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    state
        .sessions()
        .put(ShopSession {
            shop: shop.clone(),
            access_token: SecretString::from(grant.access_token),
            scopes,
            obtained_at: chrono::Utc::now().timestamp(),
        })
        .await;

    tracing::info!(shop = %shop, "App installed");
    Redirect::to("/appinstalled").into_response()
}

/// Installation confirmation.
///
/// # Route
///
/// `GET /appinstalled`
pub async fn installed() -> &'static str {
    "App installed successfully."
}
