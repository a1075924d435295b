//! Normalization of raw statement text into typed transaction fields

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::extract::RawEntry;
use crate::models::NewTransaction;

/// Date format used by statement exports (day/month/2-digit year)
pub const STATEMENT_DATE_FORMAT: &str = "%d/%m/%y";

/// Largest absolute amount accepted from a statement or manual entry
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// A field that could not be normalized, with the raw value that caused it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("empty merchant name")]
    EmptyMerchant,
}

/// Unicode bidi marks that statement exports wrap around numbers
fn is_directional_mark(c: char) -> bool {
    matches!(
        c,
        '\u{200e}' | '\u{200f}' | '\u{061c}' | '\u{202a}'..='\u{202e}' | '\u{2066}'..='\u{2069}'
    )
}

/// Parse a statement date such as `28/02/25`
pub fn parse_date(raw: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw.trim(), STATEMENT_DATE_FORMAT)
        .map_err(|_| FieldError::InvalidDate(raw.to_string()))
}

/// Parse a hand-entered date: ISO `2025-02-28` or the statement format
pub fn parse_manual_date(raw: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").or_else(|_| parse_date(raw))
}

/// Parse a statement amount such as `1,234.56` or `\u{200e}-39.46`
///
/// Directional marks and thousands separators are removed before parsing.
/// The result is normalized so equal values share one representation.
/// Amounts beyond `MAX_AMOUNT` in either direction are rejected.
pub fn parse_amount(raw: &str) -> Result<Decimal, FieldError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !is_directional_mark(*c) && *c != ',')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(FieldError::InvalidAmount(raw.to_string()));
    }

    Decimal::from_str(cleaned)
        .ok()
        .filter(|d| d.abs() <= MAX_AMOUNT)
        .map(|d| d.normalize())
        .ok_or_else(|| FieldError::InvalidAmount(raw.to_string()))
}

/// Trim a merchant name; everything else is kept exactly
pub fn normalize_merchant(raw: &str) -> String {
    raw.trim().to_string()
}

/// Normalize one extracted entry into a transaction
pub fn normalize_entry(entry: &RawEntry) -> Result<NewTransaction, FieldError> {
    let date = parse_date(&entry.date)?;
    let merchant = normalize_merchant(&entry.merchant);
    if merchant.is_empty() {
        return Err(FieldError::EmptyMerchant);
    }
    let amount = parse_amount(&entry.amount)?;

    Ok(NewTransaction {
        date,
        merchant,
        amount,
    })
}
