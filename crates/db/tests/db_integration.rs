//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `mwb_test`)
//!   `TEST_DB_PASSWORD` (default: `mwb_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use mwb_common::AppError;
use mwb_db::{
    entities::{
        contestant::{self, ContestantStatus},
        registration::{self, Category, Gender, PaymentStatus},
        vote,
    },
    repositories::{
        CategorySequenceRepository, ContestantRepository, RegistrationRepository, VoteRepository,
    },
    test_utils::{TEST_DATABASE_PREFIX, TestDatabase, TestDbConfig},
};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, Set, Statement};

fn registration_model(id: &str, invoice_id: &str, participant: &str) -> registration::ActiveModel {
    registration::ActiveModel {
        id: Set(id.to_string()),
        registration_number: Set(format!("MWB-20260309-{}", &id[id.len() - 10..])),
        full_name: Set("Siti Aminah".to_string()),
        email: Set("siti@example.com".to_string()),
        address: Set("Jl. Merdeka No. 1".to_string()),
        birth_place: Set("Jakarta".to_string()),
        birth_date: Set(NaiveDate::from_ymd_opt(2000, 5, 17).unwrap()),
        whatsapp_number: Set("081234567890".to_string()),
        gender: Set(Gender::Female),
        profession: Set("Mahasiswa".to_string()),
        province: Set("DKI Jakarta".to_string()),
        category: Set(Category::Vocal),
        nik: Set(Some("3171234567890001".to_string())),
        kia_number: Set(None),
        is_minor: Set(false),
        photo_url: Set(None),
        parental_consent_url: Set(None),
        payment_proof_url: Set(None),
        sequence: Set(1),
        invoice_id: Set(invoice_id.to_string()),
        participant_number: Set(participant.to_string()),
        invoice_amount: Set(250_010_111),
        payment_status: Set(PaymentStatus::Pending),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
        verified_at: Set(None),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_sequence_counters_are_per_category() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let repo = CategorySequenceRepository::new(db.connection());

    assert_eq!(repo.next_value("Vocal").await.unwrap(), 1);
    assert_eq!(repo.next_value("Vocal").await.unwrap(), 2);
    assert_eq!(repo.next_value("Acting").await.unwrap(), 1);
    assert_eq!(repo.current_value("Vocal").await.unwrap(), 2);
    assert_eq!(repo.current_value("Model").await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_invoice_id_is_conflict() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let repo = RegistrationRepository::new(db.connection());

    repo.create(registration_model(
        "01jt0000000000000000000001",
        "MWB-V.250.0111",
        "V-001-11",
    ))
    .await
    .unwrap();

    let result = repo
        .create(registration_model(
            "01jt0000000000000000000002",
            "MWB-V.250.0111",
            "V-001-11",
        ))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let found = repo.find_by_invoice_amount(250_010_111).await.unwrap();
    assert_eq!(found.len(), 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_vote_is_credited_once_per_transaction() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let conn = db.connection();
    let registrations = RegistrationRepository::new(Arc::clone(&conn));
    let contestants = ContestantRepository::new(Arc::clone(&conn));
    let votes = VoteRepository::new(Arc::clone(&conn));

    let registration = registrations
        .create(registration_model(
            "01jt0000000000000000000001",
            "MWB-V.250.0111",
            "V-001-11",
        ))
        .await
        .unwrap();
    let contestant = contestants
        .create(contestant::ActiveModel {
            id: Set("01jt0000000000000000000c01".to_string()),
            registration_id: Set(registration.id),
            contestant_number: Set("V-001-11".to_string()),
            name: Set("Siti Aminah".to_string()),
            category: Set(Category::Vocal),
            province: Set("DKI Jakarta".to_string()),
            photo_url: Set(None),
            bio: Set(None),
            vote_count: Set(0),
            status: Set(ContestantStatus::Active),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap();

    let vote_for = |id: &str, receipt: &str| vote::ActiveModel {
        id: Set(id.to_string()),
        receipt_number: Set(receipt.to_string()),
        contestant_id: Set(contestant.id.clone()),
        voter_name: Set("Budi".to_string()),
        voter_email: Set(None),
        amount: Set(3000),
        vote_quantity: Set(2),
        transaction_id: Set("trx-0001".to_string()),
        message: Set(None),
        created_at: Set(Utc::now().into()),
    };

    votes
        .record(vote_for("01jt0000000000000000000v01", "VOTE-20260402-0001"))
        .await
        .unwrap();
    let repeated = votes
        .record(vote_for("01jt0000000000000000000v02", "VOTE-20260402-0002"))
        .await;
    assert!(matches!(repeated, Err(AppError::Conflict(_))));

    let reloaded = contestants.find_by_id(&contestant.id).await.unwrap().unwrap();
    assert_eq!(reloaded.vote_count, 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unique_database_is_dropped() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let name = db.name().to_string();
    assert!(name.starts_with(TEST_DATABASE_PREFIX));
    let _repo = RegistrationRepository::new(db.connection());
    db.drop_database().await.unwrap();

    let admin = Database::connect(&TestDbConfig::default().postgres_url())
        .await
        .unwrap();
    let row = admin
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT COUNT(*)::BIGINT AS n FROM pg_database WHERE datname = $1",
            [name.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<i64>("", "n").unwrap(), 0);
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
