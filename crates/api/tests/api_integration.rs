//! API integration tests.
//!
//! These tests drive the full router with a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
};
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use mwb_api::{StreamingState, middleware::AppState, router as api_router};
use mwb_common::{
    LocalStorage,
    config::{PaymentConfig, RegistrationConfig},
};
use mwb_core::{
    AdminEvent, InMemorySequenceAllocator, NotificationService, RegistrationService,
    SaweriaWebhookPayload, VotingService, sign_saweria_payload,
};
use mwb_db::{
    entities::registration::{self, Category, Gender, PaymentStatus},
    repositories::{ContestantRepository, RegistrationRepository, VoteRepository},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
use serde_json::{Value as Json, json};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";
const WEBHOOK_SECRET: &str = "saweria-secret";

fn sample_registration(status: PaymentStatus) -> registration::Model {
    registration::Model {
        id: "01jt0000000000000000000001".to_string(),
        registration_number: "MWB-20260309-7ZQ3K9X2MB".to_string(),
        full_name: "Siti Aminah".to_string(),
        email: "siti@example.com".to_string(),
        address: "Jl. Merdeka No. 1".to_string(),
        birth_place: "Jakarta".to_string(),
        birth_date: NaiveDate::from_ymd_opt(2000, 5, 17).unwrap(),
        whatsapp_number: "081234567890".to_string(),
        gender: Gender::Female,
        profession: "Mahasiswa".to_string(),
        province: "DKI Jakarta".to_string(),
        category: Category::Vocal,
        nik: Some("3171234567890001".to_string()),
        kia_number: None,
        is_minor: false,
        photo_url: None,
        parental_consent_url: None,
        payment_proof_url: None,
        sequence: 1,
        invoice_id: "MWB-V.250.0111".to_string(),
        participant_number: "V-001-11".to_string(),
        invoice_amount: 250_010_111,
        payment_status: status,
        created_at: Utc.with_ymd_and_hms(2026, 3, 9, 3, 0, 0).unwrap().into(),
        updated_at: None,
        verified_at: None,
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

/// Create test app state over `db`.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);
    let registration_repo = RegistrationRepository::new(Arc::clone(&db));
    let streaming = StreamingState::new();
    let payment = PaymentConfig {
        bank_account_number: "1234567890".to_string(),
        bank_account_holder: "Yayasan MWB".to_string(),
        saweria_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        ..PaymentConfig::default()
    };

    let registration_service = RegistrationService::new(
        registration_repo.clone(),
        Arc::new(InMemorySequenceAllocator::new()),
        Arc::new(LocalStorage::new(
            std::env::temp_dir().join("mwb-api-tests"),
            "/uploads".to_string(),
        )),
        Arc::new(streaming.clone()),
        NotificationService::disabled(),
        RegistrationConfig::default(),
    );
    let voting_service = VotingService::new(
        ContestantRepository::new(Arc::clone(&db)),
        VoteRepository::new(Arc::clone(&db)),
        registration_repo,
        payment.clone(),
    );

    AppState {
        registration_service,
        voting_service,
        payment: Arc::new(payment),
        admin_token: Arc::from(ADMIN_TOKEN),
        streaming,
    }
}

fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mwb_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Json, admin: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if admin {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Json {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn registration_body(birth_date: NaiveDate, nik: Option<&str>) -> Json {
    json!({
        "fullName": "Siti Aminah",
        "email": "siti@example.com",
        "address": "Jl. Merdeka No. 1",
        "birthPlace": "Jakarta",
        "birthDate": birth_date.format("%Y-%m-%d").to_string(),
        "whatsappNumber": "081234567890",
        "gender": "Perempuan",
        "profession": "Mahasiswa",
        "province": "DKI Jakarta",
        "category": "Vocal",
        "nik": nik,
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_app(create_test_state(empty_db()));

    let response = app.oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_code_tables() {
    let app = create_app(create_test_state(empty_db()));

    let provinces = body_json(app.clone().oneshot(get("/api/meta/provinces")).await.unwrap()).await;
    let provinces = provinces.as_array().unwrap();
    assert_eq!(provinces.len(), 38);
    assert!(provinces.contains(&json!({ "name": "DKI Jakarta", "code": "11" })));

    let categories = body_json(app.oneshot(get("/api/meta/categories")).await.unwrap()).await;
    assert_eq!(
        categories,
        json!([
            { "name": "Acting", "code": "A" },
            { "name": "Vocal", "code": "V" },
            { "name": "Model", "code": "M" },
        ])
    );
}

#[tokio::test]
async fn test_admin_endpoints_require_token() {
    let app = create_app(create_test_state(empty_db()));

    let response = app
        .clone()
        .oneshot(get("/api/admin/registrations"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/api/admin/registrations/stats")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
}

#[test]
fn test_admin_token_must_match_exactly() {
    let state = create_test_state(empty_db());

    assert!(state.is_admin_token(ADMIN_TOKEN));
    assert!(!state.is_admin_token("test-admin-toke"));
    assert!(!state.is_admin_token("test-admin-token2"));
    assert!(!state.is_admin_token("TEST-ADMIN-TOKEN"));
    assert!(!state.is_admin_token(""));

    let disabled = AppState {
        admin_token: Arc::from(""),
        ..state
    };
    assert!(!disabled.is_admin_token(""));
    assert!(!disabled.is_admin_token(ADMIN_TOKEN));
}

#[tokio::test]
async fn test_lookup_registration_hides_personal_data() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_registration(PaymentStatus::Pending)]])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(get("/api/registrations/MWB-20260309-7ZQ3K9X2MB"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["invoiceId"], "MWB-V.250.0111");
    assert_eq!(json["data"]["paymentStatus"], "pending");
    assert_eq!(json["data"]["hasPaymentProof"], false);
    assert!(json["data"].get("nik").is_none());
    assert!(json["data"].get("email").is_none());
}

#[tokio::test]
async fn test_lookup_unknown_registration() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<registration::Model>::new()])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(get("/api/registrations/MWB-20260309-UNKNOWN000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "REGISTRATION_NOT_FOUND"
    );
}

#[tokio::test]
async fn test_participant_count() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row(42)]])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app.oneshot(get("/api/registrations/count")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["count"], 42);
}

#[tokio::test]
async fn test_create_registration_rejects_invalid_email() {
    let app = create_app(create_test_state(empty_db()));
    let mut body = registration_body(
        NaiveDate::from_ymd_opt(2000, 5, 17).unwrap(),
        Some("3171234567890001"),
    );
    body["email"] = json!("not-an-email");

    let response = app
        .oneshot(post_json("/api/registrations", &body, false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_registration_unknown_province() {
    let app = create_app(create_test_state(empty_db()));
    let mut body = registration_body(
        NaiveDate::from_ymd_opt(2000, 5, 17).unwrap(),
        Some("3171234567890001"),
    );
    body["province"] = json!("Atlantis");

    let response = app
        .oneshot(post_json("/api/registrations", &body, false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_registration_minor_without_guardian_documents() {
    let app = create_app(create_test_state(empty_db()));
    let today = Utc::now().date_naive();
    let ten_years_old = NaiveDate::from_ymd_opt(today.year() - 10, 1, 1).unwrap();

    let response = app
        .oneshot(post_json(
            "/api/registrations",
            &registration_body(ten_years_old, None),
            false,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "MISSING_GUARDIAN_DOCUMENTS");
    assert_eq!(
        json["error"]["fields"],
        json!(["kiaNumber", "parentalConsent"])
    );
}

#[tokio::test]
async fn test_create_registration_returns_invoice_and_notifies_admins() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_registration(PaymentStatus::Pending)]])
        .into_connection();
    let state = create_test_state(db);
    let mut admin_rx = state.streaming.subscribe();
    let app = create_app(state);

    let response = app
        .oneshot(post_json(
            "/api/registrations",
            &registration_body(
                NaiveDate::from_ymd_opt(2000, 5, 17).unwrap(),
                Some("3171234567890001"),
            ),
            false,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["registration"]["invoiceId"], "MWB-V.250.0111");
    assert_eq!(json["data"]["registration"]["participantNumber"], "V-001-11");
    assert_eq!(json["data"]["payment"]["amount"], 250_010_111);
    assert_eq!(json["data"]["payment"]["amountFormatted"], "Rp 250.010.111");
    assert_eq!(json["data"]["payment"]["bankName"], "BCA");

    let event = admin_rx.try_recv().unwrap();
    assert!(matches!(event, AdminEvent::NewRegistration(_)));
}

#[tokio::test]
async fn test_admin_stats() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            [count_row(10)],
            [count_row(3)],
            [count_row(5)],
            [count_row(2)],
            [count_row(4)],
            [count_row(3)],
            [count_row(2)],
            [count_row(1)],
        ])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(admin_get("/api/admin/registrations/stats"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 10);
    assert_eq!(json["data"]["vocal"], 5);
    assert_eq!(json["data"]["pendingVerification"], 3);
    assert_eq!(json["data"]["rejected"], 1);
}

#[tokio::test]
async fn test_admin_list_registrations() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_registration(PaymentStatus::PendingVerification)]])
        .append_query_results([[count_row(1)]])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(admin_get(
            "/api/admin/registrations?status=pending_verification&category=Vocal&limit=500",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["limit"], 200);
    assert_eq!(json["data"]["items"][0]["nik"], "3171234567890001");
    assert_eq!(json["data"]["items"][0]["gender"], "Perempuan");
}

#[tokio::test]
async fn test_admin_export_csv() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_registration(PaymentStatus::Verified)]])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(admin_get("/api/admin/registrations/export"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert!(csv.contains("\"MWB-V.250.0111\""));
}

#[tokio::test]
async fn test_verify_already_reviewed_payment_conflicts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_registration(PaymentStatus::Verified)]])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/admin/registrations/MWB-20260309-7ZQ3K9X2MB/verify",
            &json!({ "approved": true }),
            true,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reconcile_rejects_malformed_amount() {
    let app = create_app(create_test_state(empty_db()));

    let response = app
        .oneshot(post_json(
            "/api/admin/payments/reconcile",
            &json!({ "amount": 12345 }),
            true,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reconcile_lists_candidates() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_registration(PaymentStatus::PendingVerification)]])
        .into_connection();
    let app = create_app(create_test_state(db));

    let response = app
        .oneshot(post_json(
            "/api/admin/payments/reconcile",
            &json!({ "amount": 250_010_111 }),
            true,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["sequence"], 1);
    assert_eq!(json["data"]["provinceCode"], "11");
    assert_eq!(json["data"]["province"], "DKI Jakarta");
    assert_eq!(
        json["data"]["candidates"][0]["registrationNumber"],
        "MWB-20260309-7ZQ3K9X2MB"
    );
}

#[tokio::test]
async fn test_vote_link_rejects_zero_votes() {
    let app = create_app(create_test_state(empty_db()));

    let response = app
        .oneshot(post_json(
            "/api/voting/vote-link",
            &json!({ "contestantId": "01jt0000000000000000000c01", "voteQuantity": 0 }),
            false,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn webhook_payload(status: &str) -> SaweriaWebhookPayload {
    SaweriaWebhookPayload {
        id: "trx-0001".to_string(),
        amount: 3000,
        amount_raw: Some(3000),
        donator_name: Some("Budi".to_string()),
        donator_email: None,
        message: Some("Vote untuk Siti Aminah (V-001-11) - 2 votes".to_string()),
        created_at: "2026-04-02T10:00:00+07:00".to_string(),
        status: status.to_string(),
    }
}

fn webhook_json(payload: &SaweriaWebhookPayload) -> Json {
    json!({
        "id": payload.id,
        "amount": payload.amount,
        "amount_raw": payload.amount_raw,
        "donator_name": payload.donator_name,
        "message": payload.message,
        "created_at": payload.created_at,
        "status": payload.status,
    })
}

#[tokio::test]
async fn test_saweria_webhook_requires_signature() {
    let app = create_app(create_test_state(empty_db()));
    let payload = webhook_payload("success");

    let response = app
        .oneshot(post_json("/api/webhooks/saweria", &webhook_json(&payload), false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_saweria_webhook_skips_unsuccessful_payment() {
    let app = create_app(create_test_state(empty_db()));
    let payload = webhook_payload("pending");
    let signature = sign_saweria_payload(WEBHOOK_SECRET, &payload).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/saweria")
        .header(header::CONTENT_TYPE, "application/json")
        .header("saweria-callback-signature", signature)
        .body(Body::from(webhook_json(&payload).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(
        json["message"],
        "Payment status pending is not successful, skipped"
    );
}
