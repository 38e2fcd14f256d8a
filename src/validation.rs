//! Input validation for names passed to the backend CLI.
//!
//! Arguments are handed to the CLI directly (never through a shell), so the
//! concern here is names the CLI itself would misread: values that look like
//! flags, and field names that collide with the `field=value` assignment
//! syntax used when creating items.

use crate::{BrokerError, Result};

/// Characters with meaning inside a CLI field assignment (`[section.]field[type]=value`).
const ASSIGNMENT_CHARS: &str = "=.[]";

/// Maximum allowed length for item/field names.
const MAX_NAME_LENGTH: usize = 255;

/// Validates an item name.
///
/// Rejects:
/// - Empty names
/// - Excessive length (>255 characters)
/// - Null bytes and control characters
/// - A leading `-`, which the CLI would parse as a flag
///
/// # Example
///
/// ```
/// use credmux::validation::validate_item_name;
///
/// assert!(validate_item_name("clustrix-aws-validation").is_ok());
/// assert!(validate_item_name("GPU cloud (lab)").is_ok());
///
/// assert!(validate_item_name("").is_err());
/// assert!(validate_item_name("--vault=Shared").is_err());
/// ```
pub fn validate_item_name(name: &str) -> Result<()> {
    check_common(name).map_err(BrokerError::InvalidItemName)
}

/// Validates a field name.
///
/// Applies the item-name rules and additionally rejects the assignment
/// characters `=`, `.`, `[` and `]`.
pub fn validate_field_name(name: &str) -> Result<()> {
    check_common(name).map_err(BrokerError::InvalidFieldName)?;

    if name.chars().any(|c| ASSIGNMENT_CHARS.contains(c)) {
        return Err(BrokerError::InvalidFieldName(format!(
            "{:?} contains assignment characters (not allowed: {})",
            name, ASSIGNMENT_CHARS
        )));
    }

    Ok(())
}

fn check_common(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(format!(
            "name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        ));
    }

    if name.contains('\0') {
        return Err("name contains null byte".to_string());
    }

    if name.chars().any(|c| c.is_control()) {
        return Err("name contains control characters".to_string());
    }

    if name.starts_with('-') {
        return Err(format!("{:?} would be parsed as a flag", name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_item_names() {
        assert!(validate_item_name("clustrix-aws-validation").is_ok());
        assert!(validate_item_name("API_KEY_123").is_ok());
        assert!(validate_item_name("prod.database.password").is_ok());
        assert!(validate_item_name("user@example.com").is_ok());
    }

    #[test]
    fn test_empty_name() {
        let result = validate_item_name("");
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_too_long() {
        let long_name = "a".repeat(256);
        let result = validate_item_name(&long_name);
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    #[test]
    fn test_null_byte_and_control_characters() {
        assert!(validate_item_name("name\0with\0nulls")
            .unwrap_err()
            .to_string()
            .contains("null byte"));
        assert!(validate_item_name("name\nsecond-line")
            .unwrap_err()
            .to_string()
            .contains("control"));
    }

    #[test]
    fn test_flag_injection() {
        for name in ["-v", "--vault", "--format=json"] {
            let result = validate_item_name(name);
            assert!(
                matches!(result, Err(BrokerError::InvalidItemName(_))),
                "Expected '{}' to fail validation",
                name
            );
        }
    }

    #[test]
    fn test_field_names() {
        assert!(validate_field_name("aws_access_key_id").is_ok());
        assert!(validate_field_name("api key").is_ok());

        for name in ["a=b", "section.field", "token[password]", "-x", ""] {
            let result = validate_field_name(name);
            assert!(
                matches!(result, Err(BrokerError::InvalidFieldName(_))),
                "Expected '{}' to fail validation",
                name
            );
        }
    }
}
