//! Incoming payment webhooks.

use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
use mwb_common::AppResult;
use mwb_core::{SaweriaWebhookPayload, WebhookOutcome};

use crate::middleware::AppState;

/// Header carrying the hex HMAC-SHA256 of the payload.
pub const SAWERIA_SIGNATURE_HEADER: &str = "saweria-callback-signature";

/// Credit votes for a Saweria donation.
///
/// Always answers 200 with an outcome unless the signature is rejected, so the
/// gateway stops retrying payments that will never be credited.
async fn saweria(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SaweriaWebhookPayload>,
) -> AppResult<Json<WebhookOutcome>> {
    let signature = headers
        .get(SAWERIA_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    tracing::debug!(transaction_id = %payload.id, status = %payload.status, "Saweria webhook received");

    let outcome = state
        .voting_service
        .handle_saweria_webhook(payload, signature)
        .await?;
    Ok(Json(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/saweria", post(saweria))
}
