//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`.
//!
//! Response mapping:
//! - mutation `userErrors` become `422` with `{"message": <first error>}`
//! - an upstream status envelope is forwarded verbatim (status and body)
//! - other upstream failures become a generic `502`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Application-level error type for the bridge.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The app has no session for the shop yet.
    #[error("App not installed for shop: {0}")]
    NotInstalled(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture genuine upstream failures to Sentry; validation outcomes
        // (userErrors, forwarded statuses) are normal operation.
        if matches!(
            self,
            Self::Shopify(
                ShopifyError::Http(_) | ShopifyError::GraphQL(_) | ShopifyError::Parse(_)
            )
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match self {
            Self::Shopify(ShopifyError::UserError(message)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "message": message })),
            )
                .into_response(),
            Self::Shopify(ShopifyError::Status { status, body }) => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, body).into_response()
            }
            Self::Shopify(_) => {
                (StatusCode::BAD_GATEWAY, "External service error").into_response()
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::NotInstalled(shop) => (
                StatusCode::UNAUTHORIZED,
                format!("App is not installed for shop {shop}"),
            )
                .into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
