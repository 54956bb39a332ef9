//! End-to-end tests for the app-installation OAuth flow.
//!
//! The token exchange is pointed at a wiremock server; everything else -
//! CSRF state, cookie session, HMAC verification - runs for real.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use hmac::{Hmac, Mac};
use quiz_bridge_core::ShopDomain;
use quiz_bridge_server::config::{AppConfig, ShopifyConfig};
use quiz_bridge_server::routes;
use quiz_bridge_server::shopify::AdminClient;
use quiz_bridge_server::state::AppState;
use secrecy::SecretString;
use sha2::Sha256;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".parse().expect("valid address"),
        port: 0,
        base_url: "http://localhost:9000".to_string(),
        shopify: ShopifyConfig {
            api_key: "test-key".to_string(),
            api_secret: SecretString::from("test-secret"),
            scopes: vec!["read_customers".to_string(), "write_customers".to_string()],
            api_version: "2026-01".to_string(),
            shop: ShopDomain::parse("test.myshopify.com").expect("valid shop"),
            access_token: None,
        },
        sentry_dsn: None,
    }
}

fn app_against(server: &MockServer) -> Router {
    let config = test_config();
    let client = AdminClient::with_endpoint(&config.shopify, server.uri());
    routes::router(AppState::with_client(config, client))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }
    builder.body(Body::empty()).expect("valid request")
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header present")
        .to_str()
        .expect("Location is valid UTF-8")
        .to_string()
}

/// Extract the session cookie pair from a Set-Cookie header.
fn session_cookie(response: &axum::response::Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header present")
        .to_str()
        .expect("cookie is valid UTF-8");
    raw.split(';').next().expect("cookie pair").to_string()
}

/// Extract a query parameter value from a URL.
fn query_param(url: &str, name: &str) -> String {
    let (_, query) = url.split_once('?').expect("url has a query string");
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
        .unwrap_or_else(|| panic!("parameter {name} present in {url}"))
        .to_string()
}

fn sign_callback(secret: &str, code: &str, shop: &str, state: &str, timestamp: &str) -> String {
    let message = format!("code={code}&shop={shop}&state={state}&timestamp={timestamp}");
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn entry_redirects_unknown_shop_to_auth() {
    let server = MockServer::start().await;
    let app = app_against(&server);

    let response = app
        .oneshot(get("/?shop=test.myshopify.com", None))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth?shop=test.myshopify.com");
}

#[tokio::test]
async fn entry_rejects_non_platform_shop() {
    let server = MockServer::start().await;
    let app = app_against(&server);

    let response = app
        .oneshot(get("/?shop=evil.example.com", None))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?error=invalid_shop");
}

#[tokio::test]
async fn begin_redirects_to_authorization_page() {
    let server = MockServer::start().await;
    let app = app_against(&server);

    let response = app
        .oneshot(get("/auth?shop=test.myshopify.com", None))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let url = location(&response);
    assert!(url.starts_with("https://test.myshopify.com/admin/oauth/authorize?"));
    assert!(url.contains("client_id=test-key"));
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A9000%2Fauth%2Fcallback"));
    assert_eq!(query_param(&url, "state").len(), 32);
}

#[tokio::test]
async fn full_install_flow_stores_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "access_token": "shpat_granted",
            "scope": "read_customers,write_customers"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_against(&server);

    // Begin: capture the cookie session and the generated state
    let begin = app
        .clone()
        .oneshot(get("/auth?shop=test.myshopify.com", None))
        .await
        .expect("request handled");
    assert_eq!(begin.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&begin);
    let oauth_state = query_param(&location(&begin), "state");

    // Callback: signed the way the platform signs it
    let timestamp = "1700000000";
    let hmac = sign_callback(
        "test-secret",
        "authcode",
        "test.myshopify.com",
        &oauth_state,
        timestamp,
    );
    let callback_uri = format!(
        "/auth/callback?code=authcode&shop=test.myshopify.com&state={oauth_state}&timestamp={timestamp}&hmac={hmac}"
    );

    let callback = app
        .clone()
        .oneshot(get(&callback_uri, Some(&cookie)))
        .await
        .expect("request handled");
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&callback), "/appinstalled");

    // Entry now greets the installed shop
    let entry = app
        .clone()
        .oneshot(get("/?shop=test.myshopify.com", None))
        .await
        .expect("request handled");
    assert_eq!(entry.status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_with_invalid_signature_is_rejected() {
    let server = MockServer::start().await;
    let app = app_against(&server);

    let begin = app
        .clone()
        .oneshot(get("/auth?shop=test.myshopify.com", None))
        .await
        .expect("request handled");
    let cookie = session_cookie(&begin);
    let oauth_state = query_param(&location(&begin), "state");

    let callback_uri = format!(
        "/auth/callback?code=authcode&shop=test.myshopify.com&state={oauth_state}&timestamp=1700000000&hmac=deadbeef"
    );

    let callback = app
        .clone()
        .oneshot(get(&callback_uri, Some(&cookie)))
        .await
        .expect("request handled");
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&callback), "/?error=oauth_invalid_hmac");

    // No token exchange may have happened
    assert!(
        server
            .received_requests()
            .await
            .expect("recording enabled")
            .is_empty()
    );
}

#[tokio::test]
async fn callback_with_mismatched_state_is_rejected() {
    let server = MockServer::start().await;
    let app = app_against(&server);

    let begin = app
        .clone()
        .oneshot(get("/auth?shop=test.myshopify.com", None))
        .await
        .expect("request handled");
    let cookie = session_cookie(&begin);

    // Signed correctly, but for a state the session never stored
    let hmac = sign_callback(
        "test-secret",
        "authcode",
        "test.myshopify.com",
        "forged-state",
        "1700000000",
    );
    let callback_uri = format!(
        "/auth/callback?code=authcode&shop=test.myshopify.com&state=forged-state&timestamp=1700000000&hmac={hmac}"
    );

    let callback = app
        .clone()
        .oneshot(get(&callback_uri, Some(&cookie)))
        .await
        .expect("request handled");
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&callback), "/?error=oauth_invalid_state");
}
