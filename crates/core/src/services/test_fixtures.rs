//! Shared models for service tests.

use chrono::{NaiveDate, TimeZone, Utc};
use mwb_db::entities::{
    contestant::{self, ContestantStatus},
    registration::{self, Category, Gender, PaymentStatus},
};

pub fn sample_registration() -> registration::Model {
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
        payment_status: PaymentStatus::Pending,
        created_at: Utc.with_ymd_and_hms(2026, 3, 9, 3, 0, 0).unwrap().into(),
        updated_at: None,
        verified_at: None,
    }
}

pub fn sample_contestant() -> contestant::Model {
    contestant::Model {
        id: "01jt0000000000000000000c01".to_string(),
        registration_id: "01jt0000000000000000000001".to_string(),
        contestant_number: "V-001-11".to_string(),
        name: "Siti Aminah".to_string(),
        category: Category::Vocal,
        province: "DKI Jakarta".to_string(),
        photo_url: None,
        bio: None,
        vote_count: 0,
        status: ContestantStatus::Active,
        created_at: Utc.with_ymd_and_hms(2026, 4, 1, 3, 0, 0).unwrap().into(),
        updated_at: None,
    }
}
