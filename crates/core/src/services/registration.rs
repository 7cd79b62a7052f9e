//! Registration workflow.
//!
//! Intake validates the form, applies the guardian-document rule, allocates a
//! per-category sequence, derives the invoice identifiers and stores the
//! registration. Documents are uploaded afterwards; the admin dashboard and the
//! applicant are notified last.

use std::sync::{Arc, LazyLock};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{NaiveDate, Utc};
use mwb_common::{
    AppError, AppResult, DocumentKind, IdGenerator, StorageBackend,
    config::RegistrationConfig, extension_for_content_type, generate_storage_key,
};
use mwb_db::{
    entities::registration::{self, Category, Gender, PaymentStatus},
    repositories::{RegistrationFilter, RegistrationRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::codes::lookup_province_code;
use crate::eligibility::{SubmittedDocuments, evaluate_eligibility, today_in_jakarta};
use crate::error::IdentifierError;
use crate::identifier::{
    decode_payment_amount, derive_payment_amount, generate_invoice_id,
    generate_participant_number,
};
use crate::sequence::SequenceAllocatorService;
use crate::services::event_publisher::EventPublisherService;
use crate::services::notification::NotificationService;

#[allow(clippy::unwrap_used)]
static ID_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{16}$").unwrap());

/// MIME types accepted for applicant photos.
const PHOTO_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// MIME types accepted for consent letters and payment proofs.
const DOCUMENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "application/pdf",
];

fn validate_id_number(value: &str) -> Result<(), ValidationError> {
    if ID_NUMBER_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("id_number")
            .with_message("must be exactly 16 digits".into()))
    }
}

/// A file sent inline as base64, optionally as a `data:` URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    pub data: String,
    pub mime_type: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// A decoded upload, ready to store.
#[derive(Debug, Clone)]
struct DecodedDocument {
    bytes: Vec<u8>,
    content_type: String,
    file_name: String,
}

impl DocumentUpload {
    fn decode(
        &self,
        field: &str,
        allowed: &[&str],
        max_bytes: usize,
    ) -> AppResult<DecodedDocument> {
        let content_type = self.mime_type.trim().to_ascii_lowercase();
        if !allowed.contains(&content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "{field}: unsupported file type {content_type}"
            )));
        }

        let payload = match self.data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => self.data.as_str(),
        };

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|_| AppError::Validation(format!("{field}: invalid base64 data")))?;

        if bytes.is_empty() {
            return Err(AppError::Validation(format!("{field}: file is empty")));
        }
        if bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "{field}: file too large, maximum is {max_bytes} bytes"
            )));
        }

        let file_name = self
            .file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{field}.{}", extension_for_content_type(&content_type)));

        Ok(DecodedDocument {
            bytes,
            content_type,
            file_name,
        })
    }
}

/// Input for creating a registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationInput {
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 1024))]
    pub address: String,
    #[validate(length(min = 1, max = 128))]
    pub birth_place: String,
    pub birth_date: NaiveDate,
    #[validate(length(min = 8, max = 20))]
    pub whatsapp_number: String,
    pub gender: Gender,
    #[validate(length(min = 1, max = 128))]
    pub profession: String,
    pub province: String,
    pub category: String,
    /// National ID number
    #[serde(default)]
    #[validate(custom(function = "validate_id_number"))]
    pub nik: Option<String>,
    /// Child ID card number
    #[serde(default)]
    #[validate(custom(function = "validate_id_number"))]
    pub kia_number: Option<String>,
    #[serde(default)]
    pub photo: Option<DocumentUpload>,
    #[serde(default)]
    pub parental_consent: Option<DocumentUpload>,
}

impl CreateRegistrationInput {
    /// Trim text fields and treat blank optional fields as absent.
    fn normalize(&mut self) {
        fn blank_to_none(value: &mut Option<String>) {
            *value = value
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }

        self.full_name = self.full_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.address = self.address.trim().to_string();
        self.birth_place = self.birth_place.trim().to_string();
        self.whatsapp_number = self.whatsapp_number.trim().to_string();
        self.profession = self.profession.trim().to_string();
        blank_to_none(&mut self.nik);
        blank_to_none(&mut self.kia_number);
        if self
            .parental_consent
            .as_ref()
            .is_some_and(|doc| doc.data.trim().is_empty())
        {
            self.parental_consent = None;
        }
        if self
            .photo
            .as_ref()
            .is_some_and(|doc| doc.data.trim().is_empty())
        {
            self.photo = None;
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStats {
    pub total: u64,
    pub acting: u64,
    pub vocal: u64,
    pub model: u64,
    pub pending: u64,
    pub pending_verification: u64,
    pub verified: u64,
    pub rejected: u64,
}

/// Registrations that may have paid a given transfer amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub amount: i64,
    pub sequence: u32,
    pub province_code: &'static str,
    /// Usually one; more when several categories share the sequence and province.
    pub candidates: Vec<registration::Model>,
}

/// Registration service.
#[derive(Clone)]
pub struct RegistrationService {
    registration_repo: RegistrationRepository,
    sequences: SequenceAllocatorService,
    storage: Arc<dyn StorageBackend>,
    event_publisher: EventPublisherService,
    notifications: NotificationService,
    id_gen: IdGenerator,
    config: RegistrationConfig,
}

impl RegistrationService {
    /// Create a new registration service.
    #[must_use]
    pub fn new(
        registration_repo: RegistrationRepository,
        sequences: SequenceAllocatorService,
        storage: Arc<dyn StorageBackend>,
        event_publisher: EventPublisherService,
        notifications: NotificationService,
        config: RegistrationConfig,
    ) -> Self {
        Self {
            registration_repo,
            sequences,
            storage,
            event_publisher,
            notifications,
            id_gen: IdGenerator::new(),
            config,
        }
    }

    /// Register an applicant.
    pub async fn create(&self, mut input: CreateRegistrationInput) -> AppResult<registration::Model> {
        input.normalize();
        input.validate()?;

        let category = Category::from_name(&input.category)
            .ok_or_else(|| IdentifierError::UnknownCategory(input.category.clone()))?;
        lookup_province_code(&input.province)
            .ok_or_else(|| IdentifierError::UnknownProvince(input.province.clone()))?;

        let today = today_in_jakarta();
        let eligibility = evaluate_eligibility(
            input.birth_date,
            today,
            SubmittedDocuments {
                national_id: input.nik.is_some(),
                child_id: input.kia_number.is_some(),
                guardian_consent: input.parental_consent.is_some(),
            },
        )?
        .ensure_admissible()?;

        // Reject bad files before a sequence value is spent on them.
        let max_bytes = self.config.max_upload_bytes;
        let photo = input
            .photo
            .as_ref()
            .map(|doc| doc.decode("photo", PHOTO_TYPES, max_bytes))
            .transpose()?;
        let consent = input
            .parental_consent
            .as_ref()
            .map(|doc| doc.decode("parentalConsent", DOCUMENT_TYPES, max_bytes))
            .transpose()?;

        let created = self
            .insert_with_retry(&input, category, eligibility.is_minor, today)
            .await?;

        tracing::info!(
            registration_number = %created.registration_number,
            invoice_id = %created.invoice_id,
            category = category.name(),
            is_minor = eligibility.is_minor,
            "Registration created"
        );

        let stored = self.attach_documents(created, photo, consent).await;

        if let Err(e) = self.event_publisher.publish_new_registration(&stored).await {
            tracing::warn!(error = %e, "Failed to publish new registration event");
        }
        self.notifications.registration_received(&stored);

        Ok(stored)
    }

    async fn insert_with_retry(
        &self,
        input: &CreateRegistrationInput,
        category: Category,
        is_minor: bool,
        today: NaiveDate,
    ) -> AppResult<registration::Model> {
        let attempts = self.config.max_insert_attempts.max(1);

        for attempt in 1..=attempts {
            let sequence = self.sequences.next_sequence(category).await?;
            let invoice_id = generate_invoice_id(category.name(), sequence, &input.province)?;
            let participant_number =
                generate_participant_number(category.name(), sequence, &input.province)?;
            let invoice_amount = derive_payment_amount(&invoice_id)?;

            let model = registration::ActiveModel {
                id: Set(self.id_gen.generate()),
                registration_number: Set(self.id_gen.registration_number(today)),
                full_name: Set(input.full_name.clone()),
                email: Set(input.email.clone()),
                address: Set(input.address.clone()),
                birth_place: Set(input.birth_place.clone()),
                birth_date: Set(input.birth_date),
                whatsapp_number: Set(input.whatsapp_number.clone()),
                gender: Set(input.gender),
                profession: Set(input.profession.clone()),
                province: Set(input.province.clone()),
                category: Set(category),
                nik: Set(input.nik.clone()),
                kia_number: Set(input.kia_number.clone()),
                is_minor: Set(is_minor),
                photo_url: Set(None),
                parental_consent_url: Set(None),
                payment_proof_url: Set(None),
                sequence: Set(i32::try_from(sequence)
                    .map_err(|_| AppError::Internal(format!("sequence {sequence} overflows")))?),
                invoice_id: Set(invoice_id.clone()),
                participant_number: Set(participant_number),
                invoice_amount: Set(invoice_amount),
                payment_status: Set(PaymentStatus::Pending),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
                verified_at: Set(None),
            };

            match self.registration_repo.create(model).await {
                Ok(created) => return Ok(created),
                Err(AppError::Conflict(reason)) => {
                    tracing::warn!(
                        attempt,
                        invoice_id = %invoice_id,
                        reason = %reason,
                        "Registration identifiers collided, retrying with a new sequence"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::ServiceUnavailable(
            "Could not allocate a unique invoice, please try again".to_string(),
        ))
    }

    /// Store uploaded documents and record their URLs.
    ///
    /// The registration already exists at this point, so failures are logged
    /// and the registration is returned without the missing URL.
    async fn attach_documents(
        &self,
        created: registration::Model,
        photo: Option<DecodedDocument>,
        consent: Option<DecodedDocument>,
    ) -> registration::Model {
        if photo.is_none() && consent.is_none() {
            return created;
        }

        let owner = created.registration_number.clone();
        let photo_url = match photo {
            Some(doc) => self.store(DocumentKind::Photo, &owner, doc).await,
            None => None,
        };
        let consent_url = match consent {
            Some(doc) => self.store(DocumentKind::ParentalConsent, &owner, doc).await,
            None => None,
        };

        if photo_url.is_none() && consent_url.is_none() {
            return created;
        }

        let mut active: registration::ActiveModel = created.clone().into();
        if photo_url.is_some() {
            active.photo_url = Set(photo_url);
        }
        if consent_url.is_some() {
            active.parental_consent_url = Set(consent_url);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        match self.registration_repo.update(active).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(
                    registration_number = %owner,
                    error = %e,
                    "Failed to record document URLs"
                );
                created
            }
        }
    }

    async fn store(&self, kind: DocumentKind, owner: &str, doc: DecodedDocument) -> Option<String> {
        let key = generate_storage_key(kind, owner, &doc.file_name);
        match self.storage.upload(&key, &doc.bytes, &doc.content_type).await {
            Ok(file) => Some(file.url),
            Err(e) => {
                tracing::warn!(
                    registration_number = %owner,
                    folder = kind.folder(),
                    error = %e,
                    "Failed to store registration document"
                );
                None
            }
        }
    }

    /// Find a registration by its public number.
    pub async fn get_by_registration_number(&self, number: &str) -> AppResult<registration::Model> {
        self.registration_repo
            .find_by_registration_number(number)
            .await?
            .ok_or_else(|| AppError::RegistrationNotFound(number.to_string()))
    }

    /// Attach a proof of transfer and queue the registration for review.
    pub async fn upload_payment_proof(
        &self,
        number: &str,
        upload: DocumentUpload,
    ) -> AppResult<registration::Model> {
        let existing = self.get_by_registration_number(number).await?;
        if !existing.payment_status.is_reviewable() {
            return Err(AppError::Conflict(format!(
                "Payment for {number} has already been reviewed"
            )));
        }

        let doc = upload.decode("paymentProof", DOCUMENT_TYPES, self.config.max_upload_bytes)?;
        let key = generate_storage_key(DocumentKind::PaymentProof, number, &doc.file_name);
        let file = self
            .storage
            .upload(&key, &doc.bytes, &doc.content_type)
            .await?;

        let mut active: registration::ActiveModel = existing.into();
        active.payment_proof_url = Set(Some(file.url));
        active.payment_status = Set(PaymentStatus::PendingVerification);
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = self.registration_repo.update(active).await?;

        tracing::info!(registration_number = %number, "Payment proof uploaded");

        if let Err(e) = self
            .event_publisher
            .publish_payment_status_updated(&updated)
            .await
        {
            tracing::warn!(error = %e, "Failed to publish payment status event");
        }

        Ok(updated)
    }

    /// Approve or reject a registration's payment.
    pub async fn verify_payment(
        &self,
        number: &str,
        approved: bool,
    ) -> AppResult<registration::Model> {
        let existing = self.get_by_registration_number(number).await?;
        if !existing.payment_status.is_reviewable() {
            return Err(AppError::Conflict(format!(
                "Payment for {number} has already been reviewed"
            )));
        }

        let now = Utc::now();
        let mut active: registration::ActiveModel = existing.into();
        if approved {
            active.payment_status = Set(PaymentStatus::Verified);
            active.verified_at = Set(Some(now.into()));
        } else {
            active.payment_status = Set(PaymentStatus::Rejected);
        }
        active.updated_at = Set(Some(now.into()));
        let updated = self.registration_repo.update(active).await?;

        tracing::info!(
            registration_number = %number,
            status = updated.payment_status.as_str(),
            "Payment reviewed"
        );

        if let Err(e) = self
            .event_publisher
            .publish_payment_status_updated(&updated)
            .await
        {
            tracing::warn!(error = %e, "Failed to publish payment status event");
        }
        self.notifications.payment_reviewed(&updated, approved);

        Ok(updated)
    }

    /// Match a bank transfer amount to the registrations that were invoiced it.
    pub async fn reconcile_transfer(&self, amount: i64) -> AppResult<Reconciliation> {
        let parts = decode_payment_amount(amount)?;
        let candidates = self.registration_repo.find_by_invoice_amount(amount).await?;

        Ok(Reconciliation {
            amount,
            sequence: parts.sequence,
            province_code: parts.province_code,
            candidates,
        })
    }

    /// List registrations for the admin dashboard, newest first.
    pub async fn list(
        &self,
        filter: &RegistrationFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<registration::Model>, u64)> {
        let items = self
            .registration_repo
            .find_filtered(filter, limit, offset)
            .await?;
        let total = self.registration_repo.count_filtered(filter).await?;
        Ok((items, total))
    }

    /// Total number of registrations, shown on the public counter.
    pub async fn participant_count(&self) -> AppResult<u64> {
        self.registration_repo.count_all().await
    }

    /// Dashboard counters by category and payment status.
    pub async fn stats(&self) -> AppResult<RegistrationStats> {
        let repo = &self.registration_repo;
        Ok(RegistrationStats {
            total: repo.count_all().await?,
            acting: repo.count_by_category(Category::Acting).await?,
            vocal: repo.count_by_category(Category::Vocal).await?,
            model: repo.count_by_category(Category::Model).await?,
            pending: repo.count_by_status(PaymentStatus::Pending).await?,
            pending_verification: repo
                .count_by_status(PaymentStatus::PendingVerification)
                .await?,
            verified: repo.count_by_status(PaymentStatus::Verified).await?,
            rejected: repo.count_by_status(PaymentStatus::Rejected).await?,
        })
    }

    /// Export every registration as CSV, oldest first.
    pub async fn export_csv(&self) -> AppResult<String> {
        let rows = self.registration_repo.find_all_ordered().await?;
        Ok(render_csv(&rows))
    }
}

const CSV_HEADER: [&str; 11] = [
    "Nomor Registrasi",
    "Nama Lengkap",
    "Email",
    "WhatsApp",
    "Kategori",
    "Provinsi",
    "Nomor Peserta",
    "Invoice ID",
    "Jumlah Pembayaran",
    "Status Pembayaran",
    "Tanggal Daftar",
];

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render registrations as a BOM-prefixed CSV that spreadsheet apps open as UTF-8.
fn render_csv(rows: &[registration::Model]) -> String {
    let mut out = String::from("\u{feff}");
    out.push_str(
        &CSV_HEADER
            .iter()
            .map(|h| csv_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push_str("\r\n");

    for row in rows {
        let created = row
            .created_at
            .with_timezone(&chrono_tz::Asia::Jakarta)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let fields = [
            row.registration_number.as_str(),
            row.full_name.as_str(),
            row.email.as_str(),
            row.whatsapp_number.as_str(),
            row.category.name(),
            row.province.as_str(),
            row.participant_number.as_str(),
            row.invoice_id.as_str(),
            &row.invoice_amount.to_string(),
            row.payment_status.as_str(),
            &created,
        ];
        out.push_str(
            &fields
                .iter()
                .map(|f| csv_field(f))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push_str("\r\n");
    }

    out
}
