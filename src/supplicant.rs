//! wpa_supplicant control plane
//!
//! Defines the `SupplicantApi` capability the interface manager is written
//! against, plus the zbus-backed client that talks to the real supplicant
//! daemon at `fi.w1.wpa_supplicant1` on the system bus.
//!
//! The manager treats interface and network handles as opaque D-Bus object
//! paths and never inspects their structure.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use zbus::zvariant::{OwnedObjectPath, Value};
use zbus::Connection;

use crate::error::{Dot1xError, Dot1xResult};

/// D-Bus identity of wpa_supplicant
const SUPPLICANT_SERVICE: &str = "fi.w1.wpa_supplicant1";
const SUPPLICANT_PATH: &str = "/fi/w1/wpa_supplicant1";
const SUPPLICANT_IFACE: &str = "fi.w1.wpa_supplicant1";

/// Per-interface D-Bus interface name
const INTERFACE_IFACE: &str = "fi.w1.wpa_supplicant1.Interface";

/// Error name the supplicant returns when an interface name is unknown
const ERR_INTERFACE_UNKNOWN: &str = "fi.w1.wpa_supplicant1.InterfaceUnknown";

/// Capability contract for the supplicant control plane.
///
/// Implementations must not hang: callers impose their own timeouts at the
/// RPC boundary. `get_interface_path_by_name` distinguishes "not found"
/// (`Ok(None)`) from transport failure (`Err`) so the manager can decide
/// whether to create a binding.
#[async_trait]
pub trait SupplicantApi: Send + Sync {
    /// Create a new interface binding; returns its handle
    async fn create_interface(&self, ifname: &str) -> Dot1xResult<OwnedObjectPath>;

    /// Remove an interface binding; best-effort, the caller only logs failures
    async fn remove_interface(&self, path: &OwnedObjectPath) -> Dot1xResult<()>;

    /// Resolve an interface name to its handle, or `None` if the supplicant
    /// does not know the name
    async fn get_interface_path_by_name(&self, ifname: &str) -> Dot1xResult<Option<OwnedObjectPath>>;

    /// Add a network profile (opaque string key/value pairs) to an interface;
    /// returns the network handle
    async fn add_network(
        &self,
        iface: &OwnedObjectPath,
        profile: &HashMap<String, String>,
    ) -> Dot1xResult<OwnedObjectPath>;

    /// Activate a previously added network profile
    async fn select_network(
        &self,
        iface: &OwnedObjectPath,
        network: &OwnedObjectPath,
    ) -> Dot1xResult<()>;

    /// Disconnect whatever network is active on the interface
    async fn disconnect_network(&self, iface: &OwnedObjectPath) -> Dot1xResult<()>;

    /// Release the underlying transport. Safe to call once; the manager
    /// calls it exactly once, at shutdown.
    async fn close(&self);
}

/// zbus client for wpa_supplicant
pub struct SupplicantClient {
    connection: Connection,
}

impl SupplicantClient {
    /// Connect to the system bus
    pub async fn connect() -> Dot1xResult<Self> {
        let connection = Connection::system().await.map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to connect to system bus: {}", e))
        })?;
        Ok(Self { connection })
    }

    /// Call a supplicant D-Bus method and deserialize the reply
    async fn call_method<B, R>(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        body: &B,
    ) -> zbus::Result<R>
    where
        B: serde::ser::Serialize + zbus::zvariant::DynamicType,
        R: serde::de::DeserializeOwned + zbus::zvariant::Type,
    {
        self.connection
            .call_method(Some(SUPPLICANT_SERVICE), path, Some(interface), method, body)
            .await?
            .body()
            .deserialize()
    }
}

#[async_trait]
impl SupplicantApi for SupplicantClient {
    async fn create_interface(&self, ifname: &str) -> Dot1xResult<OwnedObjectPath> {
        let mut props: HashMap<&str, Value<'_>> = HashMap::new();
        props.insert("Ifname", Value::from(ifname));
        props.insert("Driver", Value::from("wired"));
        props.insert("ConfigFile", Value::from(""));

        debug!("CreateInterface {}", ifname);
        self.call_method(SUPPLICANT_PATH, SUPPLICANT_IFACE, "CreateInterface", &(props,))
            .await
            .map_err(|e| Dot1xError::Supplicant(format!("CreateInterface failed: {}", e)))
    }

    async fn remove_interface(&self, path: &OwnedObjectPath) -> Dot1xResult<()> {
        debug!("RemoveInterface {}", path);
        self.call_method(SUPPLICANT_PATH, SUPPLICANT_IFACE, "RemoveInterface", &(path,))
            .await
            .map_err(|e| Dot1xError::Supplicant(format!("RemoveInterface failed: {}", e)))
    }

    async fn get_interface_path_by_name(&self, ifname: &str) -> Dot1xResult<Option<OwnedObjectPath>> {
        let result: zbus::Result<OwnedObjectPath> = self
            .call_method(SUPPLICANT_PATH, SUPPLICANT_IFACE, "GetInterface", &(ifname,))
            .await;

        match result {
            Ok(path) => Ok(Some(path)),
            Err(zbus::Error::MethodError(ref name, _, _))
                if name.as_str() == ERR_INTERFACE_UNKNOWN =>
            {
                Ok(None)
            }
            Err(e) => Err(Dot1xError::Supplicant(format!("GetInterface failed: {}", e))),
        }
    }

    async fn add_network(
        &self,
        iface: &OwnedObjectPath,
        profile: &HashMap<String, String>,
    ) -> Dot1xResult<OwnedObjectPath> {
        let props: HashMap<&str, Value<'_>> = profile
            .iter()
            .map(|(k, v)| (k.as_str(), Value::from(v.as_str())))
            .collect();

        debug!("AddNetwork on {} ({} keys)", iface, props.len());
        self.call_method(iface.as_str(), INTERFACE_IFACE, "AddNetwork", &(props,))
            .await
            .map_err(|e| Dot1xError::Supplicant(format!("AddNetwork failed: {}", e)))
    }

    async fn select_network(
        &self,
        iface: &OwnedObjectPath,
        network: &OwnedObjectPath,
    ) -> Dot1xResult<()> {
        debug!("SelectNetwork {} on {}", network, iface);
        self.call_method(iface.as_str(), INTERFACE_IFACE, "SelectNetwork", &(network,))
            .await
            .map_err(|e| Dot1xError::Supplicant(format!("SelectNetwork failed: {}", e)))
    }

    async fn disconnect_network(&self, iface: &OwnedObjectPath) -> Dot1xResult<()> {
        debug!("Disconnect on {}", iface);
        self.call_method(iface.as_str(), INTERFACE_IFACE, "Disconnect", &())
            .await
            .map_err(|e| Dot1xError::Supplicant(format!("Disconnect failed: {}", e)))
    }

    async fn close(&self) {
        // zbus tears the connection down when the last handle drops; nothing
        // to flush here beyond noting the release.
        debug!("Releasing supplicant D-Bus connection");
    }
}
