//! Domain errors for identifier generation and eligibility.

use mwb_common::AppError;
use thiserror::Error;

use crate::eligibility::MissingGuardianDocument;

/// Errors from the identifier generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Unknown province: {0}")]
    UnknownProvince(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Malformed invoice id: {0}")]
    MalformedInvoiceId(String),

    #[error("Malformed payment amount: {0}")]
    MalformedPaymentAmount(i64),

    /// The sequence no longer fits the zero-padded field.
    #[error("Sequence {sequence} exceeds capacity of {capacity} per category")]
    SequenceExhausted { sequence: u32, capacity: u32 },

    #[error("Sequence numbers start at 1")]
    InvalidSequence,
}

/// Errors from the eligibility evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    #[error("Missing guardian documents: {0:?}")]
    MissingGuardianDocuments(Vec<MissingGuardianDocument>),

    #[error("Birth date is in the future")]
    InvalidBirthDate,
}

impl From<IdentifierError> for AppError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::UnknownProvince(_)
            | IdentifierError::UnknownCategory(_)
            | IdentifierError::MalformedInvoiceId(_)
            | IdentifierError::MalformedPaymentAmount(_) => Self::Validation(err.to_string()),
            IdentifierError::SequenceExhausted { .. } => Self::Conflict(err.to_string()),
            IdentifierError::InvalidSequence => Self::Internal(err.to_string()),
        }
    }
}

impl From<EligibilityError> for AppError {
    fn from(err: EligibilityError) -> Self {
        match err {
            EligibilityError::MissingGuardianDocuments(missing) => Self::MissingFields(
                missing
                    .iter()
                    .map(|doc| doc.field_name().to_string())
                    .collect(),
            ),
            EligibilityError::InvalidBirthDate => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_errors_map_to_client_errors() {
        let err: AppError = IdentifierError::UnknownProvince("Atlantis".into()).into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = IdentifierError::SequenceExhausted {
            sequence: 100,
            capacity: 99,
        }
        .into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_missing_documents_map_to_field_names() {
        let err: AppError = EligibilityError::MissingGuardianDocuments(vec![
            MissingGuardianDocument::ChildId,
            MissingGuardianDocument::GuardianConsent,
        ])
        .into();

        match err {
            AppError::MissingFields(fields) => {
                assert_eq!(fields, vec!["kiaNumber", "parentalConsent"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
