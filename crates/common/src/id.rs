//! ID generation utilities.

use chrono::NaiveDate;
use ulid::Ulid;

/// Length of the random tail appended to human-facing numbers.
const TAIL_LEN: usize = 10;

/// ID generator for entities and human-facing reference numbers.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based primary key.
    ///
    /// ULIDs are lexicographically sortable and shorter than UUIDs as strings.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a registration number such as `MWB-20260101-7ZQ3K9X2MB`.
    ///
    /// The date is the registration day; the tail is the random part of a ULID.
    #[must_use]
    pub fn registration_number(&self, date: NaiveDate) -> String {
        format!("MWB-{}-{}", date.format("%Y%m%d"), random_tail())
    }

    /// Generate a vote receipt number such as `VOTE-20260101-7ZQ3K9X2MB`.
    #[must_use]
    pub fn receipt_number(&self, date: NaiveDate) -> String {
        format!("VOTE-{}-{}", date.format("%Y%m%d"), random_tail())
    }
}

fn random_tail() -> String {
    let ulid = Ulid::new().to_string();
    ulid[ulid.len() - TAIL_LEN..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_registration_number_format() {
        let id_gen = IdGenerator::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let number = id_gen.registration_number(date);

        assert!(number.starts_with("MWB-20260309-"));
        assert_eq!(number.len(), "MWB-20260309-".len() + TAIL_LEN);
        assert_ne!(number, id_gen.registration_number(date));
    }

    #[test]
    fn test_receipt_number_format() {
        let id_gen = IdGenerator::new();
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert!(id_gen.receipt_number(date).starts_with("VOTE-20261231-"));
    }
}
