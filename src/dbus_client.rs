//! D-Bus client library for the dot1x daemon
//!
//! Wraps the `org.dot1x.Manager` interface with typed Rust methods. Used by
//! `dot1xcli`; does not require root.

use std::collections::HashMap;
use zbus::zvariant::OwnedValue;
use zbus::Connection;

use crate::dbus_service::{DOT1X_DBUS_PATH, DOT1X_DBUS_SERVICE};
use crate::error::{Dot1xError, Dot1xResult};
use crate::manager::Dot1xConfigRequest;

/// Manager interface name (same as the service name)
const MANAGER_IFACE: &str = "org.dot1x.Manager";

/// Client for the dot1xd daemon
pub struct Dot1xClient {
    connection: Connection,
}

impl Dot1xClient {
    /// Connect to the daemon via the system bus
    ///
    /// # Errors
    ///
    /// Returns an error if the system bus is unreachable or the daemon is
    /// not running.
    pub async fn connect() -> Dot1xResult<Self> {
        let connection = Connection::system().await.map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to connect to D-Bus: {}", e))
        })?;

        let proxy = zbus::fdo::DBusProxy::new(&connection).await.map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to create D-Bus proxy: {}", e))
        })?;

        let service_name = DOT1X_DBUS_SERVICE.try_into().map_err(|_| {
            Dot1xError::ServiceError(format!("Invalid D-Bus service name: {}", DOT1X_DBUS_SERVICE))
        })?;
        let has_owner = proxy.name_has_owner(service_name).await.map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to check service availability: {}", e))
        })?;
        if !has_owner {
            return Err(Dot1xError::ServiceError(format!(
                "Service {} is not available. Is dot1xd running?",
                DOT1X_DBUS_SERVICE
            )));
        }

        Ok(Self { connection })
    }

    /// Get daemon version
    pub async fn get_version(&self) -> Dot1xResult<String> {
        self.call_method("GetVersion", &()).await
    }

    /// Configure 802.1X authentication; returns `(success, message)`
    pub async fn configure(&self, req: &Dot1xConfigRequest) -> Dot1xResult<(bool, String)> {
        self.call_method(
            "Configure",
            &(
                req.interface.as_str(),
                req.eap_method.to_string(),
                req.identity.as_str(),
                req.password.as_str(),
                req.phase2_auth.as_str(),
                req.ca_cert.as_slice(),
                req.client_cert.as_slice(),
                req.private_key.as_slice(),
                req.private_key_passwd.as_str(),
            ),
        )
        .await
    }

    /// Disconnect the session on an interface; returns `(success, message)`
    pub async fn disconnect(&self, interface: &str) -> Dot1xResult<(bool, String)> {
        self.call_method("Disconnect", &(interface,)).await
    }

    /// Get a status snapshot for an interface
    pub async fn get_status(&self, interface: &str) -> Dot1xResult<HashMap<String, OwnedValue>> {
        self.call_method("GetStatus", &(interface,)).await
    }

    /// Names of all managed interfaces
    pub async fn list_interfaces(&self) -> Dot1xResult<Vec<String>> {
        self.call_method("ListInterfaces", &()).await
    }

    /// Proxy for the manager interface, for signal subscriptions
    pub async fn manager_proxy(&self) -> Dot1xResult<zbus::Proxy<'static>> {
        zbus::Proxy::new(
            &self.connection,
            DOT1X_DBUS_SERVICE,
            DOT1X_DBUS_PATH,
            MANAGER_IFACE,
        )
        .await
        .map_err(|e| Dot1xError::ServiceError(format!("Failed to create manager proxy: {}", e)))
    }

    /// Call a daemon D-Bus method
    async fn call_method<B, R>(&self, method: &str, body: &B) -> Dot1xResult<R>
    where
        B: serde::ser::Serialize + zbus::zvariant::DynamicType,
        R: serde::de::DeserializeOwned + zbus::zvariant::Type,
    {
        self.connection
            .call_method(
                Some(DOT1X_DBUS_SERVICE),
                DOT1X_DBUS_PATH,
                Some(MANAGER_IFACE),
                method,
                body,
            )
            .await
            .map_err(|e| Dot1xError::ServiceError(format!("D-Bus method call failed: {}", e)))?
            .body()
            .deserialize()
            .map_err(|e| Dot1xError::ServiceError(format!("Failed to deserialize response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires running daemon
    async fn test_connect() {
        let result = Dot1xClient::connect().await;
        assert!(result.is_ok(), "Failed to connect to daemon");
    }
}
