//! Registration repository.

use std::sync::Arc;

use crate::entities::{
    Registration,
    registration::{self, Category, PaymentStatus},
};
use mwb_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, Func},
};

use super::map_write_error;

/// Filters for the admin registration list.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    /// Case-insensitive match on name, email, WhatsApp number, registration
    /// number or invoice id.
    pub search: Option<String>,
    pub category: Option<Category>,
    pub payment_status: Option<PaymentStatus>,
}

impl RegistrationFilter {
    fn apply(&self, mut query: Select<Registration>) -> Select<Registration> {
        if let Some(category) = self.category {
            query = query.filter(registration::Column::Category.eq(category));
        }
        if let Some(status) = self.payment_status {
            query = query.filter(registration::Column::PaymentStatus.eq(status));
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!(
                "%{}%",
                term.to_lowercase().replace('%', "\\%").replace('_', "\\_")
            );
            let lower_like = |column: registration::Column| {
                Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone())
            };
            query = query.filter(
                Condition::any()
                    .add(lower_like(registration::Column::FullName))
                    .add(lower_like(registration::Column::Email))
                    .add(lower_like(registration::Column::WhatsappNumber))
                    .add(lower_like(registration::Column::RegistrationNumber))
                    .add(lower_like(registration::Column::InvoiceId)),
            );
        }
        query
    }
}

/// Registration repository for database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    db: Arc<DatabaseConnection>,
}

impl RegistrationRepository {
    /// Create a new registration repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a registration.
    ///
    /// A collision on any unique column is reported as [`AppError::Conflict`].
    pub async fn create(&self, model: registration::ActiveModel) -> AppResult<registration::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_error)
    }

    /// Update a registration.
    pub async fn update(&self, model: registration::ActiveModel) -> AppResult<registration::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a registration by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<registration::Model>> {
        Registration::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a registration by its public registration number.
    pub async fn find_by_registration_number(
        &self,
        number: &str,
    ) -> AppResult<Option<registration::Model>> {
        Registration::find()
            .filter(registration::Column::RegistrationNumber.eq(number))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a registration by invoice ID.
    pub async fn find_by_invoice_id(
        &self,
        invoice_id: &str,
    ) -> AppResult<Option<registration::Model>> {
        Registration::find()
            .filter(registration::Column::InvoiceId.eq(invoice_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find every registration whose invoice amount equals `amount`.
    pub async fn find_by_invoice_amount(&self, amount: i64) -> AppResult<Vec<registration::Model>> {
        Registration::find()
            .filter(registration::Column::InvoiceAmount.eq(amount))
            .order_by_asc(registration::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List registrations matching `filter`, newest first.
    pub async fn find_filtered(
        &self,
        filter: &RegistrationFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<registration::Model>> {
        filter
            .apply(Registration::find())
            .order_by_desc(registration::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count registrations matching `filter`.
    pub async fn count_filtered(&self, filter: &RegistrationFilter) -> AppResult<u64> {
        filter
            .apply(Registration::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All registrations in submission order, for export.
    pub async fn find_all_ordered(&self) -> AppResult<Vec<registration::Model>> {
        Registration::find()
            .order_by_asc(registration::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all registrations.
    pub async fn count_all(&self) -> AppResult<u64> {
        Registration::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count registrations in a category.
    pub async fn count_by_category(&self, category: Category) -> AppResult<u64> {
        Registration::find()
            .filter(registration::Column::Category.eq(category))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count registrations with a payment status.
    pub async fn count_by_status(&self, status: PaymentStatus) -> AppResult<u64> {
        Registration::find()
            .filter(registration::Column::PaymentStatus.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Highest sequence used per category.
    pub async fn max_sequence_by_category(&self) -> AppResult<Vec<(Category, i32)>> {
        Registration::find()
            .select_only()
            .column(registration::Column::Category)
            .column_as(registration::Column::Sequence.max(), "max_sequence")
            .group_by(registration::Column::Category)
            .into_tuple::<(Category, i32)>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::registration::Gender;
    use chrono::{NaiveDate, Utc};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, QueryTrait, Set, Value};
    use std::collections::BTreeMap;

    fn create_test_registration(id: &str, number: &str, invoice_id: &str) -> registration::Model {
        registration::Model {
            id: id.to_string(),
            registration_number: number.to_string(),
            full_name: "Siti Rahma".to_string(),
            email: "siti@example.com".to_string(),
            address: "Jl. Merdeka 1".to_string(),
            birth_place: "Bandung".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2000, 5, 17).unwrap(),
            whatsapp_number: "081234567890".to_string(),
            gender: Gender::Female,
            profession: "Mahasiswa".to_string(),
            province: "Jawa Barat".to_string(),
            category: Category::Vocal,
            nik: Some("3201010101010001".to_string()),
            kia_number: None,
            is_minor: false,
            photo_url: None,
            parental_consent_url: None,
            payment_proof_url: None,
            sequence: 1,
            invoice_id: invoice_id.to_string(),
            participant_number: "V-001-12".to_string(),
            invoice_amount: 250_010_112,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now().into(),
            updated_at: None,
            verified_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_registration_number() {
        let reg = create_test_registration("r1", "MWB-20260101-AAAAAAAAAA", "MWB-V.250.0112");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reg.clone()]])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let result = repo
            .find_by_registration_number("MWB-20260101-AAAAAAAAAA")
            .await
            .unwrap();

        assert_eq!(result.unwrap().invoice_id, "MWB-V.250.0112");
    }

    #[test]
    fn test_search_filter_matches_contact_columns() {
        let filter = RegistrationFilter {
            search: Some("0812".to_string()),
            category: Some(Category::Vocal),
            payment_status: None,
        };
        let sql = filter
            .apply(Registration::find())
            .build(DatabaseBackend::Postgres)
            .to_string();

        for column in [
            "full_name",
            "email",
            "whatsapp_number",
            "registration_number",
            "invoice_id",
        ] {
            assert!(sql.contains(&format!("\"{column}\"")), "{column} missing in {sql}");
        }
        assert!(sql.contains("%0812%"));
        assert!(!sql.contains("payment_status"));
    }

    #[tokio::test]
    async fn test_find_by_invoice_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<registration::Model>::new()])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let result = repo.find_by_invoice_id("MWB-A.250.9901").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_returns_inserted_model() {
        let reg = create_test_registration("r1", "MWB-20260101-AAAAAAAAAA", "MWB-V.250.0112");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reg.clone()]])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let active = registration::ActiveModel {
            id: Set(reg.id.clone()),
            invoice_id: Set(reg.invoice_id.clone()),
            ..Default::default()
        };
        let created = repo.create(active).await.unwrap();

        assert_eq!(created.id, "r1");
    }

    #[tokio::test]
    async fn test_create_duplicate_invoice_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom(
                    "duplicate key value violates unique constraint \"registration_invoice_id_key\""
                        .to_string(),
                )])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let active = registration::ActiveModel {
            id: Set("r2".to_string()),
            ..Default::default()
        };
        let err = repo.create(active).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let mut row = BTreeMap::new();
        row.insert("num_items", Value::BigInt(Some(4)));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let count = repo
            .count_by_status(PaymentStatus::PendingVerification)
            .await
            .unwrap();

        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_find_by_invoice_amount_returns_all_matches() {
        let a = create_test_registration("r1", "MWB-1", "MWB-V.250.0112");
        let mut b = create_test_registration("r2", "MWB-2", "MWB-A.250.0112");
        b.category = Category::Acting;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a, b]])
                .into_connection(),
        );

        let repo = RegistrationRepository::new(db);
        let matches = repo.find_by_invoice_amount(250_010_112).await.unwrap();

        assert_eq!(matches.len(), 2);
    }
}
