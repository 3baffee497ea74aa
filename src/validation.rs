//! Input validation and sanitization
//!
//! Interface names end up in supplicant D-Bus calls and staged file paths,
//! so they are checked before any control-plane operation.

use crate::error::{Dot1xError, Dot1xResult};

/// Maximum length for interface names (Linux kernel limit is 15)
const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Validate interface name
///
/// Interface names must be alphanumeric with optional dashes, dots and
/// underscores, and no longer than 15 characters (Linux kernel limit)
pub fn validate_interface_name(name: &str) -> Dot1xResult<()> {
    if name.is_empty() {
        return Err(Dot1xError::InvalidParameter(
            "Interface name cannot be empty".to_string()
        ));
    }

    if name.len() > MAX_INTERFACE_NAME_LEN {
        return Err(Dot1xError::InvalidParameter(
            format!("Interface name too long (max {} characters)", MAX_INTERFACE_NAME_LEN)
        ));
    }

    // Only allow alphanumeric, dash, dot, underscore
    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
            return Err(Dot1xError::InvalidParameter(
                format!("Invalid interface name '{}': contains invalid character '{}'", name, c)
            ));
        }
    }

    // Don't allow names starting with dash (could be interpreted as option)
    if name.starts_with('-') {
        return Err(Dot1xError::InvalidParameter(
            "Interface name cannot start with dash".to_string()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_interface_names() {
        assert!(validate_interface_name("eth0").is_ok());
        assert!(validate_interface_name("enp3s0").is_ok());
        assert!(validate_interface_name("eth0.100").is_ok());
        assert!(validate_interface_name("bond_0").is_ok());
    }

    #[test]
    fn test_invalid_interface_names() {
        assert!(validate_interface_name("").is_err());
        assert!(validate_interface_name("eth0; rm -rf /").is_err());
        assert!(validate_interface_name("-eth0").is_err());
        assert!(validate_interface_name("averyverylongname0").is_err());
        assert!(validate_interface_name("eth0/1").is_err());
    }
}
