//! Per-category sequence allocation.
//!
//! Every registration draws the next value of its category's counter. Values
//! are strictly increasing per category and no two callers ever receive the
//! same value, even when requests race.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mwb_common::{AppError, AppResult};
use mwb_db::entities::registration::Category;
use mwb_db::repositories::{CategorySequenceRepository, RegistrationRepository};
use tokio::sync::Mutex;

/// Source of per-category sequence numbers.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Reserve the next value for `category`. The first value is 1.
    async fn next_sequence(&self, category: Category) -> AppResult<u32>;
}

/// Shared allocator handle.
pub type SequenceAllocatorService = Arc<dyn SequenceAllocator>;

/// Database-backed allocator using an atomic upsert on the counter row.
///
/// Safe across multiple server processes sharing one database.
#[derive(Clone)]
pub struct DbSequenceAllocator {
    repo: CategorySequenceRepository,
}

impl DbSequenceAllocator {
    #[must_use]
    pub const fn new(repo: CategorySequenceRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SequenceAllocator for DbSequenceAllocator {
    async fn next_sequence(&self, category: Category) -> AppResult<u32> {
        let value = self.repo.next_value(category.name()).await?;
        u32::try_from(value)
            .map_err(|_| AppError::Internal(format!("negative sequence value {value}")))
    }
}

/// Process-local allocator.
///
/// Only correct while a single process owns registration intake. Seed it from
/// the stored registrations on startup so values continue where they left off.
#[derive(Default)]
pub struct InMemorySequenceAllocator {
    counters: Mutex<HashMap<Category, u32>>,
}

impl InMemorySequenceAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start each category's counter after the given last-used value.
    #[must_use]
    pub fn with_seed(seed: impl IntoIterator<Item = (Category, u32)>) -> Self {
        Self {
            counters: Mutex::new(seed.into_iter().collect()),
        }
    }

    /// Seed from the highest sequence stored per category.
    pub async fn seeded_from(repo: &RegistrationRepository) -> AppResult<Self> {
        let seed = repo
            .max_sequence_by_category()
            .await?
            .into_iter()
            .map(|(category, max)| (category, u32::try_from(max).unwrap_or(0)));

        Ok(Self::with_seed(seed))
    }
}

#[async_trait]
impl SequenceAllocator for InMemorySequenceAllocator {
    async fn next_sequence(&self, category: Category) -> AppResult<u32> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(category).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
