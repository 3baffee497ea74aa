//! Command-line client for dot1xd
//!
//! Talks to the daemon over D-Bus. Supports configuring and disconnecting
//! interfaces, one-shot status queries, and watching the status signal
//! stream.

use clap::{Parser, Subcommand};
use libdot1x::error::{Dot1xError, Dot1xResult};
use libdot1x::{Dot1xClient, Dot1xConfigRequest, EapMethod};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dot1xcli")]
#[command(author = "dot1xd contributors")]
#[command(version)]
#[command(about = "Control 802.1X authentication via the dot1xd daemon", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure 802.1X authentication on an interface
    Configure {
        /// Interface to authenticate
        #[arg(short, long)]
        interface: String,

        /// EAP method (PEAP, TLS, TTLS, FAST)
        #[arg(short, long)]
        eap: String,

        /// EAP identity
        #[arg(long)]
        identity: String,

        /// EAP password (PEAP/TTLS)
        #[arg(long, default_value = "")]
        password: String,

        /// Inner authentication for PEAP/TTLS
        #[arg(long, default_value = "MSCHAPV2")]
        phase2: String,

        /// CA certificate file (EAP-TLS)
        #[arg(long)]
        ca_cert: Option<PathBuf>,

        /// Client certificate file (EAP-TLS)
        #[arg(long)]
        client_cert: Option<PathBuf>,

        /// Private key file (EAP-TLS)
        #[arg(long)]
        private_key: Option<PathBuf>,

        /// Private key passphrase (EAP-TLS)
        #[arg(long, default_value = "")]
        key_passphrase: String,
    },

    /// Disconnect the 802.1X session on an interface
    Disconnect {
        /// Interface to disconnect
        interface: String,
    },

    /// Show a one-time status snapshot for an interface
    Status {
        /// Interface to query
        interface: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Watch live status updates
    Watch {
        /// Only show updates for this interface
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// List managed interfaces
    List,
}

#[tokio::main]
async fn main() -> Dot1xResult<()> {
    let args = Args::parse();
    let client = Dot1xClient::connect().await?;

    match args.command {
        Command::Configure {
            interface,
            eap,
            identity,
            password,
            phase2,
            ca_cert,
            client_cert,
            private_key,
            key_passphrase,
        } => {
            let eap_method: EapMethod = eap.parse()?;

            let req = Dot1xConfigRequest {
                interface,
                eap_method,
                identity,
                password,
                phase2_auth: phase2,
                ca_cert: read_optional(ca_cert).await?,
                client_cert: read_optional(client_cert).await?,
                private_key: read_optional(private_key).await?,
                private_key_passwd: key_passphrase,
            };

            let (success, message) = client.configure(&req).await?;
            println!("Configure result: {} - {}", success, message);
        }

        Command::Disconnect { interface } => {
            let (success, message) = client.disconnect(&interface).await?;
            println!("Disconnect result: {} - {}", success, message);
        }

        Command::Status { interface, json } => {
            let status = client.get_status(&interface).await?;
            if json {
                let map: serde_json::Map<String, serde_json::Value> = status
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_json(v)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map).map_err(|e| {
                    Dot1xError::ServiceError(format!("Failed to encode status: {}", e))
                })?);
            } else {
                let mut keys: Vec<&String> = status.keys().collect();
                keys.sort();
                for key in keys {
                    println!("{}: {}", key, display_value(&status[key]));
                }
            }
        }

        Command::Watch { interface } => {
            use futures::StreamExt;

            let proxy = client.manager_proxy().await?;
            let mut stream = proxy.receive_signal("StatusChanged").await.map_err(|e| {
                Dot1xError::ServiceError(format!("Failed to subscribe to StatusChanged: {}", e))
            })?;

            println!("Watching live interface status. Ctrl+C to exit.");
            while let Some(msg) = stream.next().await {
                let (iface, status, timestamp): (String, String, i64) =
                    msg.body().deserialize().map_err(|e| {
                        Dot1xError::ServiceError(format!("Bad StatusChanged payload: {}", e))
                    })?;
                if interface.as_deref().map_or(true, |want| want == iface) {
                    println!("[{}] {} - {}", timestamp, iface, status);
                }
            }
        }

        Command::List => {
            let interfaces = client.list_interfaces().await?;
            if interfaces.is_empty() {
                println!("No managed interfaces");
            } else {
                for name in interfaces {
                    println!("{}", name);
                }
            }
        }
    }

    Ok(())
}

/// Read a file's bytes if a path was given, empty otherwise
async fn read_optional(path: Option<PathBuf>) -> Dot1xResult<Vec<u8>> {
    match path {
        Some(path) => Ok(tokio::fs::read(&path).await.map_err(|e| {
            Dot1xError::InvalidParameter(format!("Cannot read {}: {}", path.display(), e))
        })?),
        None => Ok(Vec::new()),
    }
}

fn value_to_json(value: &zvariant::OwnedValue) -> serde_json::Value {
    if let Ok(s) = value.downcast_ref::<&str>() {
        serde_json::Value::from(s)
    } else if let Ok(i) = value.downcast_ref::<i64>() {
        serde_json::Value::from(i)
    } else {
        serde_json::Value::Null
    }
}

fn display_value(value: &zvariant::OwnedValue) -> String {
    if let Ok(s) = value.downcast_ref::<&str>() {
        s.to_string()
    } else if let Ok(i) = value.downcast_ref::<i64>() {
        i.to_string()
    } else {
        format!("{:?}", value)
    }
}
