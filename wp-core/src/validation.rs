//! Validation of user-supplied identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, WpError};

static INSTANCE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("instance name pattern is valid"));

/// Longest accepted instance name; it is embedded in container names.
pub const MAX_INSTANCE_NAME_LEN: usize = 48;

/// Validate an instance or workspace name (`[A-Za-z0-9_-]+`).
pub fn validate_instance_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(WpError::Validation(
            "Instance name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_INSTANCE_NAME_LEN {
        return Err(WpError::Validation(format!(
            "Instance name '{}' is longer than {} characters",
            name, MAX_INSTANCE_NAME_LEN
        )));
    }

    if !INSTANCE_NAME.is_match(name) {
        return Err(WpError::Validation(format!(
            "Invalid instance name '{}': only letters, digits, '-' and '_' are allowed",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_instance_name("alpha").is_ok());
        assert!(validate_instance_name("Site_2-staging").is_ok());
        assert!(validate_instance_name("42").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_instance_name("").is_err());
        assert!(validate_instance_name("with space").is_err());
        assert!(validate_instance_name("dots.not.allowed").is_err());
        assert!(validate_instance_name("../escape").is_err());
        assert!(validate_instance_name("semi;colon").is_err());
        assert!(validate_instance_name(&"x".repeat(MAX_INSTANCE_NAME_LEN + 1)).is_err());
    }
}
