//! Quiz-results route handler.
//!
//! Accepts a quiz submission and reconciles it with the shop's customer
//! records via the quiz-sync service. The shop is the configured store;
//! its session must have been established by the install flow (or seeded
//! from the environment).

use axum::{Json, extract::State};
use quiz_bridge_core::Email;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::quiz_sync::{self, QuizSubmission, SyncReceipt};
use crate::state::AppState;

/// Inbound quiz-results payload.
#[derive(Debug, Deserialize)]
pub struct QuizResultsBody {
    /// Customer email the results belong to.
    pub email: String,
    /// Arbitrary results value, stored as-is (JSON-encoded).
    pub results: serde_json::Value,
    /// Customer locale, used when a new customer is created.
    #[serde(default)]
    pub locale: Option<String>,
}

/// Sync a quiz submission into the customer's quiz-results metafield.
///
/// Responses:
/// - `200` with the mutation outcome (`action` + customer node)
/// - `422` with `{"message": …}` when the platform reports a `userError`
/// - upstream status and body forwarded verbatim on a transport-level
///   failure with a response envelope
///
/// # Route
///
/// `POST /quiz-results`
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<QuizResultsBody>,
) -> Result<Json<SyncReceipt>> {
    let email =
        Email::parse(body.email.trim()).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let shop = state.config().shopify.shop.clone();
    let session = state
        .sessions()
        .get(&shop)
        .await
        .ok_or_else(|| AppError::NotInstalled(shop.to_string()))?;

    let submission = QuizSubmission {
        email,
        results: body.results,
        locale: body.locale,
    };

    let receipt = quiz_sync::sync_submission(
        state.shopify(),
        &shop,
        &session.access_token,
        &submission,
    )
    .await?;

    tracing::info!(action = ?receipt.action, "Quiz results synced");
    Ok(Json(receipt))
}
