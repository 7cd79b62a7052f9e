//! Admin endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use mwb_common::AppResult;
use mwb_core::{
    PromoteContestantInput, RegistrationStats, codes::province_name,
    eligibility::today_in_jakarta,
};
use mwb_db::{
    entities::registration::{self, Category, Gender, PaymentStatus},
    repositories::RegistrationFilter,
};
use serde::{Deserialize, Serialize};

use super::voting::ContestantResponse;
use crate::{
    extractors::AdminAuth,
    middleware::AppState,
    response::{ApiResponse, Page},
};

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 200;

/// Full registration record for the dashboard.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegistrationResponse {
    pub id: String,
    pub registration_number: String,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub birth_place: String,
    pub birth_date: String,
    pub whatsapp_number: String,
    pub gender: Gender,
    pub profession: String,
    pub province: String,
    pub category: Category,
    pub nik: Option<String>,
    pub kia_number: Option<String>,
    pub is_minor: bool,
    pub photo_url: Option<String>,
    pub parental_consent_url: Option<String>,
    pub payment_proof_url: Option<String>,
    pub invoice_id: String,
    pub participant_number: String,
    pub invoice_amount: i64,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub verified_at: Option<String>,
}

impl From<registration::Model> for AdminRegistrationResponse {
    fn from(r: registration::Model) -> Self {
        Self {
            id: r.id,
            registration_number: r.registration_number,
            full_name: r.full_name,
            email: r.email,
            address: r.address,
            birth_place: r.birth_place,
            birth_date: r.birth_date.format("%Y-%m-%d").to_string(),
            whatsapp_number: r.whatsapp_number,
            gender: r.gender,
            profession: r.profession,
            province: r.province,
            category: r.category,
            nik: r.nik,
            kia_number: r.kia_number,
            is_minor: r.is_minor,
            photo_url: r.photo_url,
            parental_consent_url: r.parental_consent_url,
            payment_proof_url: r.payment_proof_url,
            invoice_id: r.invoice_id,
            participant_number: r.participant_number,
            invoice_amount: r.invoice_amount,
            payment_status: r.payment_status,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
            verified_at: r.verified_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List registrations query.
#[derive(Debug, Deserialize)]
pub struct ListRegistrationsQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub status: Option<PaymentStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Approve or reject a payment.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub approved: bool,
}

/// Reconcile a bank transfer.
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub amount: i64,
}

/// Reconciliation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub amount: i64,
    pub sequence: u32,
    pub province_code: &'static str,
    pub province: Option<&'static str>,
    pub candidates: Vec<AdminRegistrationResponse>,
}

async fn list_registrations(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListRegistrationsQuery>,
) -> AppResult<ApiResponse<Page<AdminRegistrationResponse>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let filter = RegistrationFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        category: query.category,
        payment_status: query.status,
    };

    let (items, total) = state
        .registration_service
        .list(&filter, limit, offset)
        .await?;

    Ok(ApiResponse::ok(Page {
        items: items.into_iter().map(Into::into).collect(),
        total,
        limit,
        offset,
    }))
}

async fn registration_stats(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RegistrationStats>> {
    let stats = state.registration_service.stats().await?;
    Ok(ApiResponse::ok(stats))
}

/// Download every registration as CSV.
async fn export_registrations(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let csv = state.registration_service.export_csv().await?;
    let disposition = format!(
        "attachment; filename=\"registrations-{}.csv\"",
        today_in_jakarta().format("%Y%m%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

async fn verify_payment(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(number): Path<String>,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<ApiResponse<AdminRegistrationResponse>> {
    let updated = state
        .registration_service
        .verify_payment(&number, req.approved)
        .await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Find the registrations a transfer amount belongs to.
async fn reconcile_payment(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<ReconcileRequest>,
) -> AppResult<ApiResponse<ReconcileResponse>> {
    let result = state
        .registration_service
        .reconcile_transfer(req.amount)
        .await?;

    Ok(ApiResponse::ok(ReconcileResponse {
        amount: result.amount,
        sequence: result.sequence,
        province_code: result.province_code,
        province: province_name(result.province_code),
        candidates: result.candidates.into_iter().map(Into::into).collect(),
    }))
}

async fn promote_contestant(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(input): Json<PromoteContestantInput>,
) -> AppResult<ApiResponse<ContestantResponse>> {
    let contestant = state.voting_service.promote(input).await?;
    Ok(ApiResponse::created(contestant.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registrations", get(list_registrations))
        .route("/registrations/stats", get(registration_stats))
        .route("/registrations/export", get(export_registrations))
        .route("/registrations/{number}/verify", post(verify_payment))
        .route("/payments/reconcile", post(reconcile_payment))
        .route("/contestants", post(promote_contestant))
}
