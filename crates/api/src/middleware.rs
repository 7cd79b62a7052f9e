//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use hmac::{Hmac, Mac};
use mwb_common::config::PaymentConfig;
use mwb_core::{RegistrationService, VotingService};
use sha2::Sha256;

use crate::extractors::AdminSession;
use crate::streaming::StreamingState;

type HmacSha256 = Hmac<Sha256>;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub registration_service: RegistrationService,
    pub voting_service: VotingService,
    pub payment: Arc<PaymentConfig>,
    pub admin_token: Arc<str>,
    pub streaming: StreamingState,
}

impl AppState {
    /// Whether `token` grants admin access.
    ///
    /// Both tokens are reduced to a MAC keyed by the configured token, so the
    /// comparison takes the same time whatever the length or content of `token`.
    #[must_use]
    pub fn is_admin_token(&self, token: &str) -> bool {
        if self.admin_token.is_empty() {
            return false;
        }
        let keyed = || HmacSha256::new_from_slice(self.admin_token.as_bytes()).ok();
        let Some(mut expected) = keyed() else {
            return false;
        };
        expected.update(self.admin_token.as_bytes());
        let expected = expected.finalize().into_bytes();

        keyed().is_some_and(|mut mac| {
            mac.update(token.as_bytes());
            mac.verify_slice(&expected).is_ok()
        })
    }
}

/// Read a bearer token from the `Authorization` header.
pub fn bearer_token(req_headers: &axum::http::HeaderMap) -> Option<&str> {
    req_headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Authentication middleware.
///
/// Marks the request as an admin session when it carries the configured token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let is_admin = bearer_token(req.headers()).is_some_and(|token| state.is_admin_token(token));
    if is_admin {
        req.extensions_mut().insert(AdminSession);
    }

    next.run(req).await
}
