//! End-to-end tests for the quiz-results flow.
//!
//! Drives the full router against a wiremock stand-in for the Admin API,
//! covering the lookup-then-branch behavior and the response mapping.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use quiz_bridge_core::ShopDomain;
use quiz_bridge_server::config::{AppConfig, ShopifyConfig};
use quiz_bridge_server::routes;
use quiz_bridge_server::sessions::ShopSession;
use quiz_bridge_server::shopify::AdminClient;
use quiz_bridge_server::state::AppState;
use secrecy::SecretString;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRAPHQL_PATH: &str = "/admin/api/2026-01/graphql.json";

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

/// Build the app against the mock server, with the shop session installed.
async fn installed_app(server: &MockServer) -> Router {
    let config = test_config();
    let client = AdminClient::with_endpoint(&config.shopify, server.uri());
    let state = AppState::with_client(config, client);

    state
        .sessions()
        .put(ShopSession {
            shop: ShopDomain::parse("test.myshopify.com").expect("valid shop"),
            access_token: SecretString::from("shpat_test_token"),
            scopes: vec!["read_customers".to_string(), "write_customers".to_string()],
            obtained_at: 1_700_000_000,
        })
        .await;

    routes::router(state)
}

fn submission_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/quiz-results")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

fn empty_lookup() -> serde_json::Value {
    serde_json::json!({"data": {"customers": {"edges": []}}})
}

fn lookup_with_match(metafield: Option<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "customers": {
                "edges": [{
                    "node": {
                        "id": "gid://shopify/Customer/1",
                        "state": "ENABLED",
                        "email": "a@b.com",
                        "locale": "en",
                        "metafield": metafield
                    }
                }]
            }
        }
    })
}

fn mutation_success(mutation: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            mutation: {
                "customer": {
                    "id": "gid://shopify/Customer/1",
                    "email": "a@b.com",
                    "locale": "en",
                    "metafield": {
                        "id": "gid://shopify/Metafield/7",
                        "value": "{\"q1\":\"yes\"}"
                    }
                },
                "userErrors": []
            }
        }
    })
}

#[tokio::test]
async fn unknown_email_triggers_exactly_one_create_and_no_update() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customersByEmail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&empty_lookup()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customerQuizResultsCreate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&mutation_success("customerCreate")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = installed_app(&server).await;
    let response = app
        .oneshot(submission_request(
            serde_json::json!({"email": "a@b.com", "results": {"q1": "yes"}}),
        ))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["action"], "created");
    assert_eq!(body["customer"]["id"], "gid://shopify/Customer/1");

    // One lookup, one create, no update
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
    assert!(
        requests
            .iter()
            .all(|r| !String::from_utf8_lossy(&r.body).contains("customerUpdate")),
        "no update call may be issued for an unknown email"
    );

    // Create variables carry the email and the serialized results
    let create_body: serde_json::Value = requests
        .iter()
        .find(|r| String::from_utf8_lossy(&r.body).contains("customerQuizResultsCreate"))
        .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
        .expect("create request present");
    let input = &create_body["variables"]["input"];
    assert_eq!(input["email"], "a@b.com");
    assert_eq!(input["metafields"][0]["value"], "{\"q1\":\"yes\"}");
    assert_eq!(input["metafields"][0]["namespace"], "custom");
    assert_eq!(input["metafields"][0]["key"], "quiz_results");
}

#[tokio::test]
async fn existing_customer_without_metafield_gets_unkeyed_update() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customersByEmail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&lookup_with_match(None)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customerQuizResultsUpdate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&mutation_success("customerUpdate")),
        )
        .expect(1)
        .mount(&server)
        .await;

    // A nested value must survive serialization exactly
    let results = serde_json::json!({"q1": "yes", "scores": [1, 2.5, null], "done": true});

    let app = installed_app(&server).await;
    let response = app
        .oneshot(submission_request(
            serde_json::json!({"email": "a@b.com", "results": results.clone()}),
        ))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["action"], "updated");

    let requests = server.received_requests().await.expect("recording enabled");
    let update_body: serde_json::Value = requests
        .iter()
        .find(|r| String::from_utf8_lossy(&r.body).contains("customerQuizResultsUpdate"))
        .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
        .expect("update request present");

    let metafield = &update_body["variables"]["input"]["metafields"][0];
    assert!(
        metafield.get("id").is_none(),
        "attach-new must not carry a metafield id"
    );
    assert_eq!(metafield["namespace"], "custom");
    assert_eq!(metafield["key"], "quiz_results");

    // Round-trip: the stored string parses back to the submitted value
    let stored = metafield["value"].as_str().expect("value is a string");
    let recovered: serde_json::Value = serde_json::from_str(stored).expect("value is JSON");
    assert_eq!(recovered, results);
}

#[tokio::test]
async fn existing_metafield_is_overwritten_by_id() {
    let server = MockServer::start().await;

    let metafield = serde_json::json!({
        "id": "gid://shopify/Metafield/7",
        "value": "{\"q1\":\"old\"}"
    });

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customersByEmail"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&lookup_with_match(Some(metafield))),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customerQuizResultsUpdate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&mutation_success("customerUpdate")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = installed_app(&server).await;
    let response = app
        .oneshot(submission_request(
            serde_json::json!({"email": "a@b.com", "results": {"q1": "yes"}}),
        ))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::OK);

    let requests = server.received_requests().await.expect("recording enabled");
    let update_body: serde_json::Value = requests
        .iter()
        .find(|r| String::from_utf8_lossy(&r.body).contains("customerQuizResultsUpdate"))
        .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
        .expect("update request present");

    let metafield = &update_body["variables"]["input"]["metafields"][0];
    assert_eq!(metafield["id"], "gid://shopify/Metafield/7");
    assert!(metafield.get("namespace").is_none());
}

#[tokio::test]
async fn user_errors_map_to_422_with_first_message_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customersByEmail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&empty_lookup()))
        .mount(&server)
        .await;

    let failure = serde_json::json!({
        "data": {
            "customerCreate": {
                "customer": null,
                "userErrors": [
                    {"field": ["input", "email"], "message": "Email has already been taken"},
                    {"field": null, "message": "second error"}
                ]
            }
        }
    });

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("customerQuizResultsCreate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&failure))
        .mount(&server)
        .await;

    let app = installed_app(&server).await;
    let response = app
        .oneshot(submission_request(
            serde_json::json!({"email": "a@b.com", "results": {"q1": "yes"}}),
        ))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Email has already been taken");
}

#[tokio::test]
async fn upstream_status_envelope_is_forwarded_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream maintenance"))
        .mount(&server)
        .await;

    let app = installed_app(&server).await;
    let response = app
        .oneshot(submission_request(
            serde_json::json!({"email": "a@b.com", "results": {}}),
        ))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    assert_eq!(&bytes[..], b"upstream maintenance");
}

#[tokio::test]
async fn missing_session_yields_unauthorized_and_no_upstream_call() {
    let server = MockServer::start().await;

    let config = test_config();
    let client = AdminClient::with_endpoint(&config.shopify, server.uri());
    let state = AppState::with_client(config, client);
    let app = routes::router(state);

    let response = app
        .oneshot(submission_request(
            serde_json::json!({"email": "a@b.com", "results": {}}),
        ))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        server
            .received_requests()
            .await
            .expect("recording enabled")
            .is_empty(),
        "no upstream call without a session"
    );
}

#[tokio::test]
async fn structurally_invalid_email_is_rejected_before_any_call() {
    let server = MockServer::start().await;

    let app = installed_app(&server).await;
    let response = app
        .oneshot(submission_request(
            serde_json::json!({"email": "not-an-email", "results": {}}),
        ))
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        server
            .received_requests()
            .await
            .expect("recording enabled")
            .is_empty(),
        "no upstream call for a rejected email"
    );
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let server = MockServer::start().await;

    let app = installed_app(&server).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("request handled");

    assert_eq!(response.status(), StatusCode::OK);
}
