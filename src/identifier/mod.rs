//! IMO vessel identifier validation
//!
//! An IMO number is seven digits where the last digit is a check digit:
//! the first six digits are multiplied by the weights 7, 6, 5, 4, 3, 2,
//! summed, and the sum taken mod 10.
//!
//! Everything in this module is pure. Higher layers call [`validate`] (or
//! [`Imo::parse`]) before issuing any network request.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Check digit weights applied to the first six digits
const WEIGHTS: [u32; 6] = [7, 6, 5, 4, 3, 2];

/// Errors produced when an identifier fails validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("'{0}' is not a 7-digit number")]
    Format(String),

    #[error("'{value}' has check digit {actual}, expected {expected}")]
    CheckDigit {
        value: String,
        expected: u32,
        actual: u32,
    },
}

/// Returns true iff `identifier` is a valid IMO number
///
/// The check is strict: exactly seven ASCII digits, no prefix, no whitespace.
///
/// # Examples
///
/// ```
/// use fleet_sounding::identifier::validate;
///
/// assert!(validate("9074729"));
/// assert!(!validate("9074728"));
/// assert!(!validate("907472"));
/// ```
pub fn validate(identifier: &str) -> bool {
    check(identifier).is_ok()
}

/// Derives the check digit for the first six digits of an IMO number
///
/// Returns `None` if `first_six` is not exactly six ASCII digits.
pub fn check_digit(first_six: &str) -> Option<u32> {
    if first_six.len() != 6 || !first_six.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = first_six
        .bytes()
        .zip(WEIGHTS.iter())
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();

    Some(sum % 10)
}

/// Strips an optional `IMO` prefix, separators and surrounding whitespace
///
/// This is for free text ("IMO 9074729", "imo: 9074729"); the result still
/// has to pass [`validate`].
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = match (trimmed.get(..3), trimmed.get(3..)) {
        (Some(prefix), Some(rest)) if prefix.eq_ignore_ascii_case("imo") => rest,
        _ => trimmed,
    };

    without_prefix
        .trim_start_matches(|c: char| c == ':' || c == '#' || c == '.' || c.is_whitespace())
        .trim()
        .to_string()
}

fn check(identifier: &str) -> Result<(), IdentifierError> {
    if identifier.len() != 7 || !identifier.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentifierError::Format(identifier.to_string()));
    }

    // check_digit cannot return None after the digit check above
    let expected = check_digit(&identifier[..6]).unwrap_or(10);
    let actual = u32::from(identifier.as_bytes()[6] - b'0');

    if expected == actual {
        Ok(())
    } else {
        Err(IdentifierError::CheckDigit {
            value: identifier.to_string(),
            expected,
            actual,
        })
    }
}

/// A validated IMO number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Imo(String);

impl Imo {
    /// Parses and validates an IMO number
    ///
    /// Accepts the loose forms handled by [`normalize`].
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let normalized = normalize(raw);
        check(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Imo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Imo {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Imo::parse(&value)
    }
}

impl From<Imo> for String {
    fn from(imo: Imo) -> Self {
        imo.0
    }
}
