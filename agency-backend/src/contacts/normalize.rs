//! Field normalization shared by import and duplicate detection

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email regex is valid")
});

/// Keep digits only; an 11-digit number with a leading US country code drops the `1`
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    }
}

/// A normalized phone number is usable when it has exactly 10 digits
pub fn is_valid_phone(normalized: &str) -> bool {
    normalized.len() == 10 && normalized.chars().all(|c| c.is_ascii_digit())
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("(555) 123-4567"), "5551234567");
        assert_eq!(normalize_phone("+1 555.123.4567"), "5551234567");
        assert_eq!(normalize_phone("15551234567"), "5551234567");
        assert_eq!(normalize_phone("25551234567"), "25551234567");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn test_phone_validity() {
        assert!(is_valid_phone("5551234567"));
        assert!(!is_valid_phone("555123456"));
        assert!(!is_valid_phone("25551234567"));
    }

    #[test]
    fn test_email_validity() {
        assert!(is_valid_email(&normalize_email("  Jane.Doe+home@Example.COM ")));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane doe@example.com"));
    }
}
