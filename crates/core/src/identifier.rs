//! Invoice IDs, participant numbers and payment amounts.
//!
//! An invoice ID looks like `MWB-V.250.0111`:
//!
//! - `MWB` product prefix
//! - `V` category code
//! - `250` base tag (the registration fee in thousands of rupiah)
//! - `01` sequence within the category, zero-padded to two digits
//! - `11` province code
//!
//! The payment amount appends the sequence and the `sequence ‖ province`
//! suffix to the base tag, so `MWB-V.250.0111` is paid as `250010111`. The
//! amount decodes back to the sequence and province code, which is what bank
//! transfer reconciliation relies on.
//!
//! All functions here are pure.

use std::sync::LazyLock;

use regex::Regex;

use crate::codes::{
    canonical_province_code, category_name, lookup_category_code, lookup_province_code,
    province_name,
};
use crate::error::IdentifierError;

/// Product prefix of every invoice ID.
pub const INVOICE_PREFIX: &str = "MWB";

/// Fixed base tag between category code and suffix.
pub const BASE_TAG: &str = "250";

/// Highest sequence an invoice ID can carry.
pub const INVOICE_SEQUENCE_CAPACITY: u32 = 99;

/// Highest sequence a participant number can carry.
pub const PARTICIPANT_SEQUENCE_CAPACITY: u32 = 999;

const BASE_AMOUNT: i64 = 250;

#[allow(clippy::unwrap_used)]
static INVOICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^MWB-([A-Z])\.250\.(\d{2})(\d{2})$").unwrap());

/// Components recovered from an invoice ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceParts {
    /// One-letter category code, e.g. `V`.
    pub category_code: char,
    /// Per-category registration sequence, 1 to 99.
    pub sequence: u32,
    /// Two-digit province code.
    pub province_code: &'static str,
}

impl InvoiceParts {
    /// Category name, e.g. `Vocal`.
    #[must_use]
    pub fn category(&self) -> &'static str {
        category_name(self.category_code).unwrap_or_default()
    }

    /// Province name, e.g. `DKI Jakarta`.
    #[must_use]
    pub fn province(&self) -> &'static str {
        province_name(self.province_code).unwrap_or_default()
    }
}

/// Components recovered from a payment amount. The category is not encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountParts {
    /// Registration sequence, 1 to 99.
    pub sequence: u32,
    /// Two-digit province code.
    pub province_code: &'static str,
}

fn check_sequence(sequence: u32, capacity: u32) -> Result<(), IdentifierError> {
    if sequence == 0 {
        return Err(IdentifierError::InvalidSequence);
    }
    if sequence > capacity {
        return Err(IdentifierError::SequenceExhausted { sequence, capacity });
    }
    Ok(())
}

fn resolve_codes(category: &str, province: &str) -> Result<(char, &'static str), IdentifierError> {
    let category_code = lookup_category_code(category)
        .ok_or_else(|| IdentifierError::UnknownCategory(category.to_string()))?;
    let province_code = lookup_province_code(province)
        .ok_or_else(|| IdentifierError::UnknownProvince(province.to_string()))?;
    Ok((category_code, province_code))
}

/// Build the invoice ID for a registration.
///
/// # Examples
///
/// ```
/// use mwb_core::identifier::generate_invoice_id;
///
/// assert_eq!(generate_invoice_id("Vocal", 1, "DKI Jakarta").unwrap(), "MWB-V.250.0111");
/// ```
pub fn generate_invoice_id(
    category: &str,
    sequence: u32,
    province: &str,
) -> Result<String, IdentifierError> {
    let (category_code, province_code) = resolve_codes(category, province)?;
    check_sequence(sequence, INVOICE_SEQUENCE_CAPACITY)?;

    Ok(format!(
        "{INVOICE_PREFIX}-{category_code}.{BASE_TAG}.{sequence:02}{province_code}"
    ))
}

/// Parse an invoice ID back into its components.
pub fn parse_invoice_id(invoice_id: &str) -> Result<InvoiceParts, IdentifierError> {
    let malformed = || IdentifierError::MalformedInvoiceId(invoice_id.to_string());

    let caps = INVOICE_RE.captures(invoice_id).ok_or_else(malformed)?;

    let category_code = caps[1].chars().next().ok_or_else(malformed)?;
    category_name(category_code).ok_or_else(malformed)?;

    let sequence: u32 = caps[2].parse().map_err(|_| malformed())?;
    if sequence == 0 {
        return Err(malformed());
    }

    let province_code = canonical_province_code(&caps[3]).ok_or_else(malformed)?;

    Ok(InvoiceParts {
        category_code,
        sequence,
        province_code,
    })
}

/// Build the public participant number, e.g. `V-001-11`.
///
/// It doubles as the contestant number in the voting round and is generated
/// once per registration.
pub fn generate_participant_number(
    category: &str,
    sequence: u32,
    province: &str,
) -> Result<String, IdentifierError> {
    let (category_code, province_code) = resolve_codes(category, province)?;
    check_sequence(sequence, PARTICIPANT_SEQUENCE_CAPACITY)?;

    Ok(format!("{category_code}-{sequence:03}-{province_code}"))
}

/// Payment amount in rupiah for an invoice ID.
///
/// # Examples
///
/// ```
/// use mwb_core::identifier::derive_payment_amount;
///
/// assert_eq!(derive_payment_amount("MWB-V.250.0111").unwrap(), 250_010_111);
/// ```
pub fn derive_payment_amount(invoice_id: &str) -> Result<i64, IdentifierError> {
    let parts = parse_invoice_id(invoice_id)?;
    Ok(amount_for(parts.sequence, parts.province_code))
}

fn amount_for(sequence: u32, province_code: &str) -> i64 {
    let province: i64 = province_code.parse().unwrap_or_default();
    let sequence = i64::from(sequence);
    // 250 ‖ ss ‖ ss ‖ pp
    BASE_AMOUNT * 1_000_000 + sequence * 10_000 + sequence * 100 + province
}

/// Recover the sequence and province code from a payment amount.
///
/// Only amounts produced by [`derive_payment_amount`] decode; anything else is
/// [`IdentifierError::MalformedPaymentAmount`].
pub fn decode_payment_amount(amount: i64) -> Result<AmountParts, IdentifierError> {
    let malformed = || IdentifierError::MalformedPaymentAmount(amount);

    if amount / 1_000_000 != BASE_AMOUNT {
        return Err(malformed());
    }

    let suffix = amount % 1_000_000;
    let sequence = suffix / 10_000;
    let repeated = (suffix / 100) % 100;
    let province = suffix % 100;

    if sequence == 0 || sequence != repeated {
        return Err(malformed());
    }

    let province_code = canonical_province_code(&format!("{province:02}")).ok_or_else(malformed)?;
    let sequence = u32::try_from(sequence).map_err(|_| malformed())?;

    Ok(AmountParts {
        sequence,
        province_code,
    })
}
