//! Interface configuration manager
//!
//! Owns the authoritative mapping from interface names to supplicant handles,
//! translates EAP requests into supplicant network profiles, stages EAP-TLS
//! credential material, and handles teardown at shutdown.
//!
//! Errors are two-tier and never conflated: a `ConfigOutcome` with
//! `success = false` is a validated business rejection (bad request,
//! supplicant said no), while an `Err` return is a systemic fault (credential
//! staging I/O). Callers map the two onto transport semantics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedObjectPath;

use crate::config::Dot1xConfig;
use crate::credentials::CredentialStore;
use crate::eap::EapMethod;
use crate::error::Dot1xResult;
use crate::supplicant::{SupplicantApi, SupplicantClient};
use crate::validation;

/// A single 802.1X configuration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dot1xConfigRequest {
    /// Logical interface name (e.g. "eth0")
    pub interface: String,
    /// EAP method
    pub eap_method: EapMethod,
    /// EAP identity
    pub identity: String,
    /// Password for PEAP/TTLS
    pub password: String,
    /// Inner authentication method for PEAP/TTLS (e.g. "MSCHAPV2")
    pub phase2_auth: String,
    /// CA certificate bytes (EAP-TLS)
    pub ca_cert: Vec<u8>,
    /// Client certificate bytes (EAP-TLS)
    pub client_cert: Vec<u8>,
    /// Private key bytes (EAP-TLS)
    pub private_key: Vec<u8>,
    /// Optional private key passphrase (EAP-TLS)
    pub private_key_passwd: String,
}

/// Result of a configure or disconnect operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOutcome {
    /// Whether the operation took effect
    pub success: bool,
    /// Human-readable detail for the caller
    pub message: String,
}

impl ConfigOutcome {
    fn ok(message: &str) -> Self {
        Self { success: true, message: message.to_string() }
    }

    fn rejected<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// 802.1X interface configuration manager
pub struct InterfaceManager {
    /// Control-plane client
    client: Arc<dyn SupplicantApi>,
    /// Interface name -> supplicant handle; an entry exists iff the manager
    /// believes the supplicant has a live binding for that name
    interfaces: RwLock<HashMap<String, OwnedObjectPath>>,
    /// Staged credential files, removed at shutdown
    credentials: CredentialStore,
    /// Whether a successful disconnect drops the registry entry
    forget_on_disconnect: bool,
}

impl InterfaceManager {
    /// Create a manager connected to the real supplicant on the system bus
    pub async fn connect(config: &Dot1xConfig) -> Dot1xResult<Self> {
        let client = SupplicantClient::connect().await?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Create a manager with a caller-supplied control-plane client.
    /// Used by tests to inject a recording double.
    pub fn with_client(client: Arc<dyn SupplicantApi>, config: &Dot1xConfig) -> Self {
        Self {
            client,
            interfaces: RwLock::new(HashMap::new()),
            credentials: CredentialStore::new(config.paths.scratch_dir.clone()),
            forget_on_disconnect: config.behavior.forget_on_disconnect,
        }
    }

    /// Configure 802.1X authentication on an interface.
    ///
    /// Validation short-circuits with a rejection outcome; control-plane
    /// failures also surface as rejections carrying the underlying message.
    /// Only credential staging I/O escalates to `Err`.
    ///
    /// The interface handle is cached in the registry as soon as it is
    /// resolved or created, before profile activation, so a later disconnect
    /// finds it even if activation fails. Staged files are not rolled back
    /// on later failure; configure is deliberately non-transactional.
    pub async fn configure(&self, req: &Dot1xConfigRequest) -> Dot1xResult<ConfigOutcome> {
        let Some(eap) = req.eap_method.as_supplicant_str() else {
            return Ok(ConfigOutcome::rejected("Invalid EAP method"));
        };

        if req.identity.is_empty() {
            return Ok(ConfigOutcome::rejected("Identity is required"));
        }

        if req.eap_method.uses_certificates()
            && (req.ca_cert.is_empty() || req.client_cert.is_empty() || req.private_key.is_empty())
        {
            return Ok(ConfigOutcome::rejected("TLS credentials missing"));
        }

        if let Err(e) = validation::validate_interface_name(&req.interface) {
            return Ok(ConfigOutcome::rejected(e.to_string()));
        }

        let iface_path = match self.resolve_interface(&req.interface).await {
            Ok(path) => path,
            Err(e) => return Ok(ConfigOutcome::rejected(e.to_string())),
        };

        // Register before activation; overwrites any prior handle for the name
        self.interfaces
            .write()
            .await
            .insert(req.interface.clone(), iface_path.clone());

        let profile = self.build_profile(req, eap).await?;

        let network = match self.client.add_network(&iface_path, &profile).await {
            Ok(path) => path,
            Err(e) => return Ok(ConfigOutcome::rejected(e.to_string())),
        };

        if let Err(e) = self.client.select_network(&iface_path, &network).await {
            return Ok(ConfigOutcome::rejected(e.to_string()));
        }

        info!("Configured 802.1X ({}) on {}", eap, req.interface);
        Ok(ConfigOutcome::ok("Configured"))
    }

    /// Disconnect the active 802.1X session on an interface
    pub async fn disconnect(&self, interface: &str) -> Dot1xResult<ConfigOutcome> {
        let iface_path = {
            let interfaces = self.interfaces.read().await;
            match interfaces.get(interface) {
                Some(path) => path.clone(),
                None => return Ok(ConfigOutcome::rejected("Interface not managed")),
            }
        };

        if let Err(e) = self.client.disconnect_network(&iface_path).await {
            return Ok(ConfigOutcome::rejected(e.to_string()));
        }

        if self.forget_on_disconnect {
            self.interfaces.write().await.remove(interface);
            debug!("Dropped registry entry for {}", interface);
        }

        info!("Disconnected 802.1X on {}", interface);
        Ok(ConfigOutcome::ok("Disconnected"))
    }

    /// Whether an interface is currently in the registry
    pub async fn is_managed(&self, interface: &str) -> bool {
        self.interfaces.read().await.contains_key(interface)
    }

    /// Names of all managed interfaces
    pub async fn managed_interfaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.interfaces.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Best-effort teardown: remove staged credential files, remove every
    /// supplicant interface binding, release the control-plane connection.
    /// Cleanup failures are logged and never escalated; callers must drain
    /// in-flight requests before invoking this.
    pub async fn shutdown(&self) {
        self.credentials.cleanup().await;

        let drained: Vec<(String, OwnedObjectPath)> =
            self.interfaces.write().await.drain().collect();
        for (name, path) in drained {
            if let Err(e) = self.client.remove_interface(&path).await {
                warn!("Failed to remove supplicant interface {}: {}", name, e);
            }
        }

        self.client.close().await;
        info!("Interface manager shut down");
    }

    /// Look the interface up in the supplicant, creating a binding if it is
    /// not known there yet
    async fn resolve_interface(&self, name: &str) -> Dot1xResult<OwnedObjectPath> {
        match self.client.get_interface_path_by_name(name).await? {
            Some(path) => {
                debug!("Resolved existing supplicant interface {}", name);
                Ok(path)
            }
            None => {
                debug!("Creating supplicant interface {}", name);
                self.client.create_interface(name).await
            }
        }
    }

    /// Build the supplicant network profile for a request. EAP-TLS requests
    /// stage their credential material here; staging failure aborts with a
    /// systemic error.
    async fn build_profile(
        &self,
        req: &Dot1xConfigRequest,
        eap: &'static str,
    ) -> Dot1xResult<HashMap<String, String>> {
        let mut profile = HashMap::from([
            ("eap".to_string(), eap.to_string()),
            ("identity".to_string(), req.identity.clone()),
            ("key_mgmt".to_string(), "IEEE8021X".to_string()),
            ("eapol_flags".to_string(), "0".to_string()),
        ]);

        if req.eap_method.uses_password() {
            profile.insert("password".to_string(), req.password.clone());
            profile.insert("phase2".to_string(), format!("auth={}", req.phase2_auth));
        }

        if req.eap_method.uses_certificates() {
            let ca = self.credentials.stage(&req.ca_cert, "ca.pem").await?;
            let cert = self.credentials.stage(&req.client_cert, "client.pem").await?;
            let key = self.credentials.stage(&req.private_key, "key.pem").await?;

            profile.insert("ca_cert".to_string(), ca.to_string_lossy().into_owned());
            profile.insert("client_cert".to_string(), cert.to_string_lossy().into_owned());
            profile.insert("private_key".to_string(), key.to_string_lossy().into_owned());

            if !req.private_key_passwd.is_empty() {
                profile.insert(
                    "private_key_passwd".to_string(),
                    req.private_key_passwd.clone(),
                );
            }
        }

        Ok(profile)
    }

    /// Paths of every staged credential file so far
    pub async fn staged_credentials(&self) -> Vec<std::path::PathBuf> {
        self.credentials.staged_paths().await
    }
}
