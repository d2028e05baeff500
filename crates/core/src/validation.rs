//! Input validation utilities.
//!
//! Loosely typed input from a binding (JSON body, CLI argument) is turned into typed values here
//! before it reaches the lifecycle or the coordinator.

use crate::constants::MAX_CLINICAL_TEXT_LEN;
use crate::error::{ClinicError, ClinicResult};
use chrono::NaiveDate;
use vethere_types::{NonEmptyText, TextError};

/// Validates a required clinical free-text field (diagnosis, treatment).
///
/// The value is trimmed; it must be non-empty and at most [`MAX_CLINICAL_TEXT_LEN`] bytes.
///
/// # Errors
///
/// Returns [`ClinicError::Validation`] naming `field`.
pub fn validate_clinical_text(field: &str, value: &str) -> ClinicResult<NonEmptyText> {
    NonEmptyText::bounded(value, MAX_CLINICAL_TEXT_LEN).map_err(|e| match e {
        TextError::Empty => ClinicError::Validation(format!("{} must not be empty", field)),
        other => ClinicError::Validation(format!("{}: {}", field, other)),
    })
}

/// Parses a local calendar day in `YYYY-MM-DD` form.
pub fn parse_appointment_date(value: &str) -> ClinicResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ClinicError::Validation(format!(
            "invalid date '{}' (expected YYYY-MM-DD): {}",
            value, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clinical_text_is_trimmed() {
        let text = validate_clinical_text("diagnosis", "  Otitis ").unwrap();
        assert_eq!(text.as_str(), "Otitis");
    }

    #[test]
    fn clinical_text_empty_names_the_field() {
        match validate_clinical_text("treatment", " \t") {
            Err(ClinicError::Validation(msg)) => assert_eq!(msg, "treatment must not be empty"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn clinical_text_too_long() {
        let long = "a".repeat(MAX_CLINICAL_TEXT_LEN + 1);
        assert!(matches!(
            validate_clinical_text("diagnosis", &long),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_appointment_date("2026-03-14").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
        );
        assert!(parse_appointment_date("14/03/2026").is_err());
        assert!(parse_appointment_date("2026-02-30").is_err());
    }
}
