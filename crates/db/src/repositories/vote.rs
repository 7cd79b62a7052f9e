//! Vote repository.

use std::sync::Arc;

use crate::entities::{Contestant, Vote, contestant, vote};
use mwb_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, sea_query::Expr,
};

use super::map_write_error;

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by payment transaction ID.
    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::TransactionId.eq(transaction_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent votes for a contestant.
    pub async fn find_by_contestant(
        &self,
        contestant_id: &str,
        limit: u64,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::ContestantId.eq(contestant_id))
            .order_by_desc(vote::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a vote and add its quantity to the contestant's count in one transaction.
    ///
    /// A repeated transaction ID fails with [`AppError::Conflict`] and leaves the
    /// count untouched.
    pub async fn record(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let inserted = model.insert(&txn).await.map_err(map_write_error)?;

        Contestant::update_many()
            .col_expr(
                contestant::Column::VoteCount,
                Expr::col(contestant::Column::VoteCount).add(i64::from(inserted.vote_quantity)),
            )
            .col_expr(
                contestant::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(contestant::Column::Id.eq(inserted.contestant_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted)
    }
}
