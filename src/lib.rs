//! libdot1x - 802.1X wired authentication control library
//!
//! Async library behind the dot1xd daemon, providing:
//! - Interface configuration management (EAP profiles via wpa_supplicant)
//! - Credential staging for EAP-TLS certificate material
//! - The `fi.w1.wpa_supplicant1` D-Bus control-plane client
//! - The `org.dot1x.Manager` D-Bus service and its client library

pub mod error;
pub mod validation;
pub mod config;
pub mod eap;
pub mod credentials;
pub mod supplicant;
pub mod manager;
pub mod dbus_service;
pub mod dbus_client;

// Re-export commonly used types
pub use error::{Dot1xError, Dot1xResult};
pub use config::Dot1xConfig;
pub use eap::EapMethod;
pub use credentials::CredentialStore;
pub use supplicant::{SupplicantApi, SupplicantClient};
pub use manager::{ConfigOutcome, Dot1xConfigRequest, InterfaceManager};
pub use dbus_service::{Dot1xControl, Dot1xDbusService, DOT1X_DBUS_PATH, DOT1X_DBUS_SERVICE};
pub use dbus_client::Dot1xClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_constants() {
        assert_eq!(DOT1X_DBUS_SERVICE, "org.dot1x.Manager");
        assert_eq!(DOT1X_DBUS_PATH, "/org/dot1x/Manager");
    }
}
