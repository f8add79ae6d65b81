//! Field-level rules.
//!
//! Each rule is a pure function over the raw form text. Optional fields
//! accept blank input.

use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;

use super::{Field, ValidationError, ValidationResult};

pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 120;
const MIN_NAME_CHARS: usize = 2;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s+()\-]+$").unwrap());

/// Name: required, at least two characters, letters and spaces only.
///
/// Accented letters count as letters.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(Field::Name));
    }
    if trimmed.chars().count() < MIN_NAME_CHARS {
        return Err(ValidationError::TooShort {
            field: Field::Name,
            min: MIN_NAME_CHARS,
        });
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return Err(ValidationError::InvalidFormat {
            field: Field::Name,
            expected: "letters and spaces only",
        });
    }
    Ok(())
}

/// Age: a whole number of years within 0..=120.
pub fn validate_age(age: &str) -> ValidationResult<u8> {
    let value: i64 = age
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber(Field::Age))?;

    if !(MIN_AGE..=MAX_AGE).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: Field::Age,
            range: "0 to 120",
        });
    }
    // Range check above guarantees the cast.
    Ok(value as u8)
}

/// Email: optional; `local@domain.tld` with no whitespace.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || EMAIL_PATTERN.is_match(trimmed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: Field::Email,
            expected: "name@domain.tld",
        })
    }
}

/// Phone: optional; digits, spaces, hyphens, parentheses and `+`.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let trimmed = phone.trim();
    if trimmed.is_empty() || PHONE_PATTERN.is_match(trimmed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: Field::Phone,
            expected: "digits, spaces, '-', '(', ')' and '+'",
        })
    }
}

/// Weight or height: optional; a finite number strictly above zero.
pub fn validate_measurement(field: Field, value: &str) -> ValidationResult<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber(field))?;
    if !parsed.is_finite() {
        return Err(ValidationError::NotANumber(field));
    }
    if parsed <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field,
            range: "greater than zero",
        });
    }
    Ok(Some(parsed))
}

/// Birth date: optional; `YYYY-MM-DD`, not in the future.
pub fn validate_birth_date(value: &str) -> ValidationResult<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: Field::BirthDate,
            expected: "YYYY-MM-DD",
        }
    })?;
    if date > Utc::now().date_naive() {
        return Err(ValidationError::OutOfRange {
            field: Field::BirthDate,
            range: "today or earlier",
        });
    }
    Ok(Some(date))
}
