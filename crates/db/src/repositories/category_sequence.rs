//! Category sequence repository.

use std::sync::Arc;

use crate::entities::{CategorySequence, category_sequence};
use mwb_common::{AppError, AppResult};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, Statement};

const NEXT_VALUE_SQL: &str = "\
    INSERT INTO category_sequence (category, last_value, updated_at) \
    VALUES ($1, 1, CURRENT_TIMESTAMP) \
    ON CONFLICT (category) DO UPDATE \
    SET last_value = category_sequence.last_value + 1, updated_at = CURRENT_TIMESTAMP \
    RETURNING last_value";

/// Repository over the per-category counters.
#[derive(Clone)]
pub struct CategorySequenceRepository {
    db: Arc<DatabaseConnection>,
}

impl CategorySequenceRepository {
    /// Create a new category sequence repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Atomically increment the counter for `category` and return the new value.
    ///
    /// The first call for a category creates the row and returns 1. Concurrent
    /// callers are serialized by the row lock taken by the upsert.
    pub async fn next_value(&self, category: &str) -> AppResult<i32> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                NEXT_VALUE_SQL,
                [category.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database("sequence upsert returned no row".to_string()))?;

        row.try_get::<i32>("", "last_value")
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Current counter value for `category`, or 0 if nothing was allocated yet.
    pub async fn current_value(&self, category: &str) -> AppResult<i32> {
        let row = CategorySequence::find_by_id(category)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map_or(0, |r: category_sequence::Model| r.last_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{MockDatabase, Value};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_next_value_reads_returning_row() {
        let mut row = BTreeMap::new();
        row.insert("last_value", Value::Int(Some(7)));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .into_connection(),
        );

        let repo = CategorySequenceRepository::new(db);
        assert_eq!(repo.next_value("Vocal").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_current_value_defaults_to_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category_sequence::Model>::new()])
                .into_connection(),
        );

        let repo = CategorySequenceRepository::new(db);
        assert_eq!(repo.current_value("Model").await.unwrap(), 0);
    }
}
