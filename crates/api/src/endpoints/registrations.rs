//! Public registration endpoints.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post},
};
use mwb_common::AppResult;
use mwb_core::{CreateRegistrationInput, DocumentUpload, format_rupiah};
use mwb_db::entities::registration::{self, Category, PaymentStatus};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Inline uploads are base64, so a request carries roughly 4/3 of the file bytes.
const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// What an applicant can see about their own registration.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatusResponse {
    pub registration_number: String,
    pub full_name: String,
    pub category: Category,
    pub province: String,
    pub invoice_id: String,
    pub participant_number: String,
    pub invoice_amount: i64,
    pub payment_status: PaymentStatus,
    pub is_minor: bool,
    pub has_payment_proof: bool,
    pub created_at: String,
    pub verified_at: Option<String>,
}

impl From<registration::Model> for RegistrationStatusResponse {
    fn from(r: registration::Model) -> Self {
        Self {
            registration_number: r.registration_number,
            full_name: r.full_name,
            category: r.category,
            province: r.province,
            invoice_id: r.invoice_id,
            participant_number: r.participant_number,
            invoice_amount: r.invoice_amount,
            payment_status: r.payment_status,
            is_minor: r.is_minor,
            has_payment_proof: r.payment_proof_url.is_some(),
            created_at: r.created_at.to_rfc3339(),
            verified_at: r.verified_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Bank transfer instructions for a new registration.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructions {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    pub amount: i64,
    pub amount_formatted: String,
}

/// Created registration response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRegistrationResponse {
    pub registration: RegistrationStatusResponse,
    pub payment: PaymentInstructions,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Register an applicant.
async fn create_registration(
    State(state): State<AppState>,
    Json(input): Json<CreateRegistrationInput>,
) -> AppResult<ApiResponse<CreatedRegistrationResponse>> {
    let created = state.registration_service.create(input).await?;

    let payment = PaymentInstructions {
        bank_name: state.payment.bank_name.clone(),
        account_number: state.payment.bank_account_number.clone(),
        account_holder: state.payment.bank_account_holder.clone(),
        amount: created.invoice_amount,
        amount_formatted: format_rupiah(created.invoice_amount),
    };

    Ok(ApiResponse::created(CreatedRegistrationResponse {
        registration: created.into(),
        payment,
    }))
}

/// Total number of registrations.
async fn participant_count(State(state): State<AppState>) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.registration_service.participant_count().await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Look up a registration by its number.
async fn get_registration(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> AppResult<ApiResponse<RegistrationStatusResponse>> {
    let found = state
        .registration_service
        .get_by_registration_number(&number)
        .await?;
    Ok(ApiResponse::ok(found.into()))
}

/// Upload a proof of transfer.
async fn upload_payment_proof(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Json(upload): Json<DocumentUpload>,
) -> AppResult<ApiResponse<RegistrationStatusResponse>> {
    let updated = state
        .registration_service
        .upload_payment_proof(&number, upload)
        .await?;
    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_registration))
        .route("/count", get(participant_count))
        .route("/{number}", get(get_registration))
        .route("/{number}/payment-proof", post(upload_payment_proof))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}
