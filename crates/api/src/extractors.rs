//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use mwb_common::AppError;

/// Marker set by the auth middleware on requests carrying the admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

/// Admin-only extractor.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .map(|_| Self)
            .ok_or(AppError::Unauthorized)
    }
}
