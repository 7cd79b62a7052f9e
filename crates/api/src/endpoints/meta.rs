//! Meta endpoints.

use axum::{Json, Router, routing::get};
use mwb_core::codes::{CATEGORIES, PROVINCES};
use serde::Serialize;

use crate::middleware::AppState;

/// Liveness response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// A code table entry.
#[derive(Serialize)]
pub struct CodeEntry {
    pub name: &'static str,
    pub code: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Provinces accepted on the form, in table order.
async fn provinces() -> Json<Vec<CodeEntry>> {
    Json(
        PROVINCES
            .iter()
            .map(|(name, code)| CodeEntry {
                name,
                code: (*code).to_string(),
            })
            .collect(),
    )
}

/// Audition categories.
async fn categories() -> Json<Vec<CodeEntry>> {
    Json(
        CATEGORIES
            .iter()
            .map(|(name, code)| CodeEntry {
                name,
                code: code.to_string(),
            })
            .collect(),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/provinces", get(provinces))
        .route("/categories", get(categories))
}
