//! Input validation utilities.
//!
//! Checks applied to owner-supplied and requester-supplied values before they reach storage
//! or the evaluator.

use crate::constants::{MAX_PIN_LEN, MIN_PIN_LEN};
use crate::{CoreError, CoreResult};

/// Validates that a PIN has the accepted shape: 4 to 12 ASCII digits.
///
/// This is a syntactic check only. It lets the evaluator refuse obviously malformed
/// credentials without consulting the verifier.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] if the PIN has the wrong length or contains
/// non-digit characters. The message never echoes the PIN.
pub fn validate_pin_format(pin: &str) -> CoreResult<()> {
    if pin.len() < MIN_PIN_LEN || pin.len() > MAX_PIN_LEN {
        return Err(CoreError::InvalidInput(format!(
            "PIN must be between {} and {} digits",
            MIN_PIN_LEN, MAX_PIN_LEN
        )));
    }

    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidInput(
            "PIN must contain only digits".into(),
        ));
    }

    Ok(())
}

/// Trims a free-text list entry (condition, medication) and rejects blank input.
pub fn normalise_list_entry(entry: &str, what: &str) -> CoreResult<String> {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_format_accepts_digits_in_range() {
        validate_pin_format("1234").expect("four digits");
        validate_pin_format("123456789012").expect("twelve digits");
    }

    #[test]
    fn pin_format_rejects_bad_shapes() {
        for pin in ["", "123", "1234567890123", "12a4", "12 34", "１２３４"] {
            assert!(validate_pin_format(pin).is_err(), "{pin:?} should fail");
        }
    }

    #[test]
    fn pin_errors_do_not_echo_input() {
        let err = validate_pin_format("98x7").unwrap_err();
        assert!(!err.to_string().contains("98x7"));
    }

    #[test]
    fn list_entry_is_trimmed() {
        assert_eq!(
            normalise_list_entry("  Metformin 500mg ", "medication").unwrap(),
            "Metformin 500mg"
        );
        assert!(normalise_list_entry("   ", "medication").is_err());
    }
}
