use crate::error::{AppError, Result};

/// The shortest password accepted at signup or password change.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Trims and lower-cases an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a new password.
///
/// # Arguments
///
/// * `password` - The password to validate.
/// * `message` - The error message to report when it is too short.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is long enough.
pub fn validate_password(password: &str, message: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(message.to_string()));
    }

    Ok(())
}

/// Returns the value when present and non-empty. Whitespace counts.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Returns the value when present and not blank.
pub fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Cook@Example.COM "), "cook@example.com");
    }

    #[test]
    fn password_length_is_counted_in_characters() {
        assert!(validate_password("12345", "short").is_err());
        assert!(validate_password("123456", "short").is_ok());
        assert!(validate_password("ééééé", "short").is_err());
    }

    #[test]
    fn blank_values_are_missing() {
        assert_eq!(required(None), None);
        assert_eq!(required(Some("   ")), None);
        assert_eq!(required(Some("x")), Some("x"));
    }

    #[test]
    fn whitespace_passwords_are_present() {
        assert_eq!(present(None), None);
        assert_eq!(present(Some("")), None);
        assert_eq!(present(Some("   ")), Some("   "));
    }
}
