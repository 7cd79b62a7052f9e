//! Contestant repository.

use std::sync::Arc;

use crate::entities::{
    Contestant,
    contestant::{self, ContestantStatus},
    registration::Category,
};
use mwb_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use super::map_write_error;

/// Contestant repository for database operations.
#[derive(Clone)]
pub struct ContestantRepository {
    db: Arc<DatabaseConnection>,
}

impl ContestantRepository {
    /// Create a new contestant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a contestant. A second promotion of the same registration is a conflict.
    pub async fn create(&self, model: contestant::ActiveModel) -> AppResult<contestant::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_error)
    }

    /// Update a contestant.
    pub async fn update(&self, model: contestant::ActiveModel) -> AppResult<contestant::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a contestant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<contestant::Model>> {
        Contestant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the contestant promoted from a registration.
    pub async fn find_by_registration_id(
        &self,
        registration_id: &str,
    ) -> AppResult<Option<contestant::Model>> {
        Contestant::find()
            .filter(contestant::Column::RegistrationId.eq(registration_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a contestant by public number.
    pub async fn find_by_number(&self, number: &str) -> AppResult<Option<contestant::Model>> {
        Contestant::find()
            .filter(contestant::Column::ContestantNumber.eq(number))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active contestants, most votes first.
    pub async fn find_active(
        &self,
        category: Option<Category>,
    ) -> AppResult<Vec<contestant::Model>> {
        let mut query = Contestant::find().filter(contestant::Column::Status.eq(ContestantStatus::Active));

        if let Some(category) = category {
            query = query.filter(contestant::Column::Category.eq(category));
        }

        query
            .order_by_desc(contestant::Column::VoteCount)
            .order_by_asc(contestant::Column::ContestantNumber)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
