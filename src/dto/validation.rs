//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a room code is exactly 6 uppercase alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("AB12CD") // Ok
/// validate_room_code("ab12cd") // Err - lowercase
/// validate_room_code("AB12C")  // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != 6 {
        let mut err = ValidationError::new("room_code_length");
        err.message =
            Some(format!("Room code must be exactly 6 characters (got {})", code.len()).into());
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a display name: 1 to 50 characters once surrounding whitespace is
/// trimmed.
pub fn validate_user_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("name_empty");
        err.message = Some("Name must not be empty".into());
        return Err(err);
    }
    if trimmed.chars().count() > 50 {
        let mut err = ValidationError::new("name_length");
        err.message = Some("Name must be at most 50 characters".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("ABC123").is_ok());
        assert!(validate_room_code("ZZZZZZ").is_ok());
        assert!(validate_room_code("000000").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("ABC12").is_err()); // too short
        assert!(validate_room_code("ABC1234").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("abc123").is_err()); // lowercase
        assert!(validate_room_code("ABC 12").is_err()); // space
        assert!(validate_room_code("ABC-12").is_err()); // punctuation
    }

    #[test]
    fn test_validate_user_name() {
        assert!(validate_user_name("Alice").is_ok());
        assert!(validate_user_name("  Bob  ").is_ok()); // trimmed before check
        assert!(validate_user_name("").is_err());
        assert!(validate_user_name("   ").is_err());
        assert!(validate_user_name(&"x".repeat(51)).is_err());
        assert!(validate_user_name(&"x".repeat(50)).is_ok());
    }
}
