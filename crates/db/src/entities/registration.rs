//! Registration entity: one applicant's audition entry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audition category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Category {
    #[sea_orm(string_value = "Acting")]
    Acting,
    #[sea_orm(string_value = "Vocal")]
    Vocal,
    #[sea_orm(string_value = "Model")]
    Model,
}

impl Category {
    /// Display name, which is also the key of the category code table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Acting => "Acting",
            Self::Vocal => "Vocal",
            Self::Model => "Model",
        }
    }

    /// Parse an exact, case-sensitive category name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Acting" => Some(Self::Acting),
            "Vocal" => Some(Self::Vocal),
            "Model" => Some(Self::Model),
            _ => None,
        }
    }
}

/// Applicant gender as recorded on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Gender {
    #[sea_orm(string_value = "Laki-laki")]
    #[serde(rename = "Laki-laki")]
    Male,
    #[sea_orm(string_value = "Perempuan")]
    #[serde(rename = "Perempuan")]
    Female,
}

/// Registration payment state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum PaymentStatus {
    /// Invoice issued, nothing uploaded yet.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Proof of transfer uploaded, waiting for an admin.
    #[sea_orm(string_value = "pending_verification")]
    PendingVerification,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl PaymentStatus {
    /// Whether an admin may still approve or reject this registration.
    #[must_use]
    pub const fn is_reviewable(self) -> bool {
        matches!(self, Self::Pending | Self::PendingVerification)
    }

    /// Wire value, as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingVerification => "pending_verification",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registration")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Human-facing reference, e.g. `MWB-20260309-7ZQ3K9X2MB`
    #[sea_orm(unique)]
    pub registration_number: String,

    pub full_name: String,
    pub email: String,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub birth_place: String,
    pub birth_date: Date,
    pub whatsapp_number: String,
    pub gender: Gender,
    pub profession: String,
    pub province: String,
    pub category: Category,

    /// National ID number (16 digits)
    #[sea_orm(nullable)]
    pub nik: Option<String>,
    /// Child ID card number (16 digits)
    #[sea_orm(nullable)]
    pub kia_number: Option<String>,
    /// Computed at registration time from the birth date
    pub is_minor: bool,

    #[sea_orm(nullable)]
    pub photo_url: Option<String>,
    #[sea_orm(nullable)]
    pub parental_consent_url: Option<String>,
    #[sea_orm(nullable)]
    pub payment_proof_url: Option<String>,

    /// Per-category sequence value the identifiers were derived from
    pub sequence: i32,
    #[sea_orm(unique)]
    pub invoice_id: String,
    #[sea_orm(unique)]
    pub participant_number: String,
    /// Transfer amount in rupiah, unique per (sequence, province) within a category
    pub invoice_amount: i64,
    pub payment_status: PaymentStatus,

    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(nullable)]
    pub verified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::contestant::Entity")]
    Contestant,
}

impl Related<super::contestant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contestant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
