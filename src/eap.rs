//! EAP method selection
//!
//! Methods are a closed enumeration with an explicit `Unspecified` sentinel.
//! The supplicant wire string for each method comes from a fixed table, never
//! from mangling a display name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Dot1xError;

/// EAP authentication method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EapMethod {
    /// No method selected; rejected by validation
    #[default]
    Unspecified,
    /// Protected EAP with an inner authentication method
    Peap,
    /// Certificate-based authentication
    Tls,
    /// Tunneled TLS with an inner authentication method
    Ttls,
    /// Flexible Authentication via Secure Tunneling
    Fast,
}

impl EapMethod {
    /// Value for the supplicant `eap` network property, or `None` for the
    /// `Unspecified` sentinel
    pub fn as_supplicant_str(&self) -> Option<&'static str> {
        match self {
            EapMethod::Unspecified => None,
            EapMethod::Peap => Some("PEAP"),
            EapMethod::Tls => Some("TLS"),
            EapMethod::Ttls => Some("TTLS"),
            EapMethod::Fast => Some("FAST"),
        }
    }

    /// Whether the profile carries `password` and `phase2` keys
    pub fn uses_password(&self) -> bool {
        matches!(self, EapMethod::Peap | EapMethod::Ttls)
    }

    /// Whether the profile carries staged certificate and key paths
    pub fn uses_certificates(&self) -> bool {
        matches!(self, EapMethod::Tls)
    }
}

impl fmt::Display for EapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_supplicant_str().unwrap_or("UNSPECIFIED"))
    }
}

impl FromStr for EapMethod {
    type Err = Dot1xError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PEAP" => Ok(EapMethod::Peap),
            "TLS" => Ok(EapMethod::Tls),
            "TTLS" => Ok(EapMethod::Ttls),
            "FAST" => Ok(EapMethod::Fast),
            other => Err(Dot1xError::InvalidParameter(
                format!("Unknown EAP method: {}", other)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplicant_strings() {
        assert_eq!(EapMethod::Peap.as_supplicant_str(), Some("PEAP"));
        assert_eq!(EapMethod::Tls.as_supplicant_str(), Some("TLS"));
        assert_eq!(EapMethod::Ttls.as_supplicant_str(), Some("TTLS"));
        assert_eq!(EapMethod::Fast.as_supplicant_str(), Some("FAST"));
        assert_eq!(EapMethod::Unspecified.as_supplicant_str(), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("PEAP".parse::<EapMethod>().unwrap(), EapMethod::Peap);
        assert_eq!("tls".parse::<EapMethod>().unwrap(), EapMethod::Tls);
        assert!("EAP_PEAP".parse::<EapMethod>().is_err());
        assert!("".parse::<EapMethod>().is_err());
    }

    #[test]
    fn test_classification() {
        assert!(EapMethod::Peap.uses_password());
        assert!(EapMethod::Ttls.uses_password());
        assert!(!EapMethod::Fast.uses_password());
        assert!(!EapMethod::Tls.uses_password());
        assert!(EapMethod::Tls.uses_certificates());
        assert!(!EapMethod::Peap.uses_certificates());
    }

    #[test]
    fn test_default_is_unspecified() {
        assert_eq!(EapMethod::default(), EapMethod::Unspecified);
    }
}
