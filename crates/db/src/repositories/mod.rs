//! Repositories wrapping sea-orm queries for each aggregate.

mod category_sequence;
mod contestant;
mod registration;
mod vote;

pub use category_sequence::CategorySequenceRepository;
pub use contestant::ContestantRepository;
pub use registration::{RegistrationFilter, RegistrationRepository};
pub use vote::VoteRepository;

use mwb_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert/update error, surfacing unique-key collisions as [`AppError::Conflict`].
pub(crate) fn map_write_error(err: DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(err.to_string())
    } else {
        AppError::Database(err.to_string())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err.to_string().contains("duplicate key value")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_write_error_detects_duplicate_key() {
        let err = DbErr::Custom(
            "duplicate key value violates unique constraint \"registration_invoice_id_key\""
                .to_string(),
        );
        assert!(matches!(map_write_error(err), AppError::Conflict(_)));
    }

    #[test]
    fn test_map_write_error_other_errors() {
        let err = DbErr::Custom("connection reset".to_string());
        assert!(matches!(map_write_error(err), AppError::Database(_)));
    }
}
