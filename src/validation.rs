// Custom validators used by request DTOs

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use validator::ValidationError;

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        // Optional leading +, then 9 to 15 digits with single spaces or dashes
        Regex::new(r"^\+?[0-9](?:[ -]?[0-9]){8,14}$").expect("phone regex is valid")
    })
}

/// Phone numbers: digits with optional `+` prefix and separators
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_regex().is_match(phone.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone_number"))
    }
}

/// Prices must be strictly positive
pub fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

/// Rejects empty and whitespace-only strings
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Trim a string and drop it when nothing is left
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_phones() {
        for phone in ["0901234567", "+84901234567", "090-123-4567", "090 123 4567"] {
            assert!(validate_phone(phone).is_ok(), "{} should be accepted", phone);
        }
    }

    #[test]
    fn test_invalid_phones() {
        for phone in ["", "abc", "12345", "++84901234567", "0901--234567"] {
            assert!(validate_phone(phone).is_err(), "{} should be rejected", phone);
        }
    }

    #[test]
    fn test_positive_decimal() {
        assert!(validate_positive_decimal(&dec!(0.01)).is_ok());
        assert!(validate_positive_decimal(&dec!(0)).is_err());
        assert!(validate_positive_decimal(&dec!(-5)).is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Sedan").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  red ".into())), Some("red".to_string()));
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(None), None);
    }
}
