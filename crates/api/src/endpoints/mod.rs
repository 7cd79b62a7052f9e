//! API endpoints.

#![allow(missing_docs)]

mod admin;
mod meta;
mod registrations;
mod voting;
mod webhooks;

use axum::{Router, routing::get};

use crate::middleware::AppState;

pub use admin::AdminRegistrationResponse;
pub use registrations::RegistrationStatusResponse;
pub use voting::ContestantResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(meta::health))
        .nest("/meta", meta::router())
        .nest("/registrations", registrations::router())
        .nest("/admin", admin::router())
        .nest("/voting", voting::router())
        .nest("/webhooks", webhooks::router())
}
