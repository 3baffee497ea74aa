//! D-Bus control interface for the 802.1X manager
//!
//! Exposes `org.dot1x.Manager` on the system bus. The interface is a thin
//! adapter: it deserializes requests, forwards them to the
//! [`InterfaceManager`](crate::manager::InterfaceManager), and logs timing and
//! outcome. Business rejections come back as a `(success, message)` pair;
//! systemic manager errors map to D-Bus errors.
//!
//! Status reporting is a stub source of telemetry, not business logic: the
//! daemon does not query authentication state from the supplicant.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::zvariant::Value;
use zbus::{fdo, interface, Connection};

use crate::eap::EapMethod;
use crate::error::{Dot1xError, Dot1xResult};
use crate::manager::{Dot1xConfigRequest, InterfaceManager};

/// D-Bus service name
pub const DOT1X_DBUS_SERVICE: &str = "org.dot1x.Manager";

/// D-Bus object path
pub const DOT1X_DBUS_PATH: &str = "/org/dot1x/Manager";

/// Seconds between StatusChanged signal emissions
const STATUS_TICK_SECS: u64 = 3;

/// The `org.dot1x.Manager` D-Bus interface
#[derive(Clone)]
pub struct Dot1xControl {
    manager: Arc<InterfaceManager>,
}

impl Dot1xControl {
    pub fn new(manager: Arc<InterfaceManager>) -> Self {
        Self { manager }
    }
}

#[interface(name = "org.dot1x.Manager")]
impl Dot1xControl {
    /// Get daemon version
    async fn get_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// Configure 802.1X authentication on an interface.
    ///
    /// Returns `(success, message)`; `success = false` is a validated
    /// rejection, a D-Bus error is a systemic daemon fault.
    #[allow(clippy::too_many_arguments)]
    async fn configure(
        &self,
        interface: String,
        eap_method: String,
        identity: String,
        password: String,
        phase2_auth: String,
        ca_cert: Vec<u8>,
        client_cert: Vec<u8>,
        private_key: Vec<u8>,
        private_key_passwd: String,
    ) -> fdo::Result<(bool, String)> {
        let req = Dot1xConfigRequest {
            interface,
            eap_method: eap_method.parse().unwrap_or(EapMethod::Unspecified),
            identity,
            password,
            phase2_auth,
            ca_cert,
            client_cert,
            private_key,
            private_key_passwd,
        };

        let start = Instant::now();
        let outcome = self
            .manager
            .configure(&req)
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))?;
        info!(
            "Configure {} ({}) in {:?}: {}",
            req.interface,
            req.eap_method,
            start.elapsed(),
            outcome.message
        );

        Ok((outcome.success, outcome.message))
    }

    /// Disconnect the 802.1X session on an interface
    async fn disconnect(&self, interface: String) -> fdo::Result<(bool, String)> {
        info!("Disconnect {}", interface);
        let outcome = self
            .manager
            .disconnect(&interface)
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))?;
        Ok((outcome.success, outcome.message))
    }

    /// Get a point-in-time status snapshot for an interface (stub telemetry)
    async fn get_status(&self, interface: String) -> fdo::Result<HashMap<String, Value<'_>>> {
        let managed = self.manager.is_managed(&interface).await;
        let status = if managed { "configured" } else { "unmanaged" };

        let mut info = HashMap::new();
        info.insert("Interface".to_string(), Value::new(interface));
        info.insert("Status".to_string(), Value::new(status.to_string()));
        info.insert("EapState".to_string(), Value::new("unknown".to_string()));
        info.insert("LastEvent".to_string(), Value::new(String::new()));
        info.insert(
            "Timestamp".to_string(),
            Value::new(chrono::Utc::now().timestamp()),
        );
        info.insert("IpAddress".to_string(), Value::new(String::new()));
        Ok(info)
    }

    /// Names of all managed interfaces
    async fn list_interfaces(&self) -> Vec<String> {
        let names = self.manager.managed_interfaces().await;
        debug!("ListInterfaces returning {} entries", names.len());
        names
    }

    /// StatusChanged signal - periodic status telemetry per managed interface
    #[zbus(signal)]
    async fn status_changed(
        signal_emitter: &SignalEmitter<'_>,
        interface: &str,
        status: &str,
        timestamp: i64,
    ) -> zbus::Result<()>;
}

/// Running D-Bus service: owns the bus connection, the registered interface
/// and the status signal ticker
pub struct Dot1xDbusService {
    connection: Connection,
    manager: Arc<InterfaceManager>,
    running: Arc<RwLock<bool>>,
}

impl Dot1xDbusService {
    /// Register the interface on the system bus, request the well-known
    /// name and start the status ticker
    pub async fn start(manager: Arc<InterfaceManager>) -> Dot1xResult<Arc<Self>> {
        info!("Starting dot1x D-Bus service");

        let connection = Connection::system().await.map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to connect to D-Bus: {}", e))
        })?;

        let control = Dot1xControl::new(manager.clone());
        connection
            .object_server()
            .at(DOT1X_DBUS_PATH, control)
            .await
            .map_err(|e| {
                Dot1xError::ServiceError(format!("Failed to register Manager interface: {}", e))
            })?;
        info!("Registered {} at {}", DOT1X_DBUS_SERVICE, DOT1X_DBUS_PATH);

        connection.request_name(DOT1X_DBUS_SERVICE).await.map_err(|e| {
            Dot1xError::ServiceError(format!(
                "Failed to request D-Bus name '{}': {}",
                DOT1X_DBUS_SERVICE, e
            ))
        })?;

        let service = Arc::new(Self {
            connection,
            manager,
            running: Arc::new(RwLock::new(true)),
        });

        service.spawn_status_ticker();

        info!("dot1x D-Bus service started");
        Ok(service)
    }

    /// Whether the service is still running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Stop the status ticker; the object stays registered until the
    /// connection drops
    pub async fn stop(&self) {
        info!("Stopping dot1x D-Bus service");
        let mut running = self.running.write().await;
        *running = false;
    }

    /// The manager behind the service
    pub fn manager(&self) -> Arc<InterfaceManager> {
        self.manager.clone()
    }

    /// Emit StatusChanged for every managed interface on a fixed tick.
    /// Mirrors the streaming telemetry of the RPC surface; values are stub
    /// readings, not supplicant state.
    fn spawn_status_ticker(self: &Arc<Self>) {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(tokio::time::Duration::from_secs(STATUS_TICK_SECS));
            loop {
                ticker.tick().await;
                if !service.is_running().await {
                    break;
                }
                if let Err(e) = service.emit_status_tick().await {
                    warn!("Status tick failed: {}", e);
                }
            }
            debug!("Status ticker stopped");
        });
    }

    async fn emit_status_tick(&self) -> Dot1xResult<()> {
        let names = self.manager.managed_interfaces().await;
        if names.is_empty() {
            return Ok(());
        }

        let iface_ref = self
            .connection
            .object_server()
            .interface::<_, Dot1xControl>(DOT1X_DBUS_PATH)
            .await
            .map_err(|e| Dot1xError::ServiceError(format!("Interface lookup failed: {}", e)))?;

        let timestamp = chrono::Utc::now().timestamp();
        for name in names {
            Dot1xControl::status_changed(iface_ref.signal_emitter(), &name, "configured", timestamp)
                .await
                .map_err(|e| {
                    Dot1xError::ServiceError(format!("Failed to emit StatusChanged: {}", e))
                })?;
        }
        Ok(())
    }
}
