//! Minor and guardian-consent eligibility rule.
//!
//! Applicants under 17, and applicants of any age without a national ID
//! (NIK), must supply both a child ID number (KIA) and a signed parental
//! consent letter.

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::error::EligibilityError;

/// Age from which an applicant is no longer a minor.
pub const ADULT_AGE: u32 = 17;

/// A guardian document that the applicant still has to supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingGuardianDocument {
    /// Child ID (KIA) number.
    ChildId,
    /// Signed parental consent letter.
    GuardianConsent,
}

impl MissingGuardianDocument {
    /// Request field the applicant has to fill in.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::ChildId => "kiaNumber",
            Self::GuardianConsent => "parentalConsent",
        }
    }
}

/// Which identity documents came with a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmittedDocuments {
    /// A national ID (NIK) was entered.
    pub national_id: bool,
    /// A child ID (KIA) number was entered.
    pub child_id: bool,
    /// A parental consent letter was attached.
    pub guardian_consent: bool,
}

/// Outcome of the eligibility rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    /// Age in whole years on the evaluation date.
    pub age: u32,
    /// Younger than [`ADULT_AGE`].
    pub is_minor: bool,
    /// Minor, or no national ID supplied.
    pub requires_guardian_documents: bool,
    /// Empty when the submission is admissible.
    pub missing: Vec<MissingGuardianDocument>,
}

impl Eligibility {
    /// No guardian document is missing.
    #[must_use]
    pub fn is_admissible(&self) -> bool {
        self.missing.is_empty()
    }

    /// Turn a non-admissible outcome into an error naming each missing document.
    pub fn ensure_admissible(self) -> Result<Self, EligibilityError> {
        if self.is_admissible() {
            Ok(self)
        } else {
            Err(EligibilityError::MissingGuardianDocuments(self.missing))
        }
    }
}

/// Whole years between `birth` and `today`, or `None` if `birth` is after `today`.
///
/// A birthday counts once its month and day have been reached, so someone born
/// on 29 February turns a year older on 1 March in common years.
#[must_use]
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }

    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Evaluate the guardian-document rule for a submission.
pub fn evaluate_eligibility(
    birth_date: NaiveDate,
    today: NaiveDate,
    documents: SubmittedDocuments,
) -> Result<Eligibility, EligibilityError> {
    let age = age_on(birth_date, today).ok_or(EligibilityError::InvalidBirthDate)?;
    let is_minor = age < ADULT_AGE;
    let requires_guardian_documents = is_minor || !documents.national_id;

    let mut missing = Vec::new();
    if requires_guardian_documents {
        if !documents.child_id {
            missing.push(MissingGuardianDocument::ChildId);
        }
        if !documents.guardian_consent {
            missing.push(MissingGuardianDocument::GuardianConsent);
        }
    }

    Ok(Eligibility {
        age,
        is_minor,
        requires_guardian_documents,
        missing,
    })
}

/// Today's date in Western Indonesia Time, where the audition runs.
#[must_use]
pub fn today_in_jakarta() -> NaiveDate {
    Utc::now()
        .with_timezone(&chrono_tz::Asia::Jakarta)
        .date_naive()
}
