//! 802.1X Authentication Daemon (dot1xd)
//!
//! Exposes the `org.dot1x.Manager` D-Bus interface for configuring 802.1X
//! wired authentication through wpa_supplicant.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (requires root/sudo)
//! sudo dot1xd
//!
//! # Start with verbose logging
//! sudo dot1xd --verbose
//!
//! # Use a non-default config file
//! sudo dot1xd --config /etc/dot1xd/dot1xd.toml
//! ```

use clap::Parser;
use libdot1x::error::{Dot1xError, Dot1xResult};
use libdot1x::{Dot1xConfig, Dot1xDbusService, InterfaceManager};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// 802.1X Authentication Daemon
#[derive(Parser, Debug)]
#[command(name = "dot1xd")]
#[command(author = "dot1xd contributors")]
#[command(version)]
#[command(about = "802.1X authentication daemon - D-Bus interface over wpa_supplicant", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Shared state for signal handling
struct DaemonState {
    running: Arc<RwLock<bool>>,
}

impl DaemonState {
    fn new() -> Self {
        Self {
            running: Arc::new(RwLock::new(true)),
        }
    }

    async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("Daemon stop requested");
    }
}

#[tokio::main]
async fn main() -> Dot1xResult<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting 802.1X Authentication Daemon (dot1xd)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Check if running as root
    #[cfg(target_os = "linux")]
    {
        let uid = unsafe { libc::getuid() };
        if uid != 0 {
            warn!("Not running as root - supplicant operations may fail");
        }
    }

    // Load configuration
    let config = match &args.config {
        Some(path) => Dot1xConfig::load(path)?,
        None => Dot1xConfig::default(),
    };
    config.ensure_directories()?;

    // Create daemon state for signal handling
    let state = Arc::new(DaemonState::new());
    let state_clone = state.clone();

    tokio::spawn(async move {
        if let Err(e) = handle_signals(state_clone).await {
            error!("Signal handler error: {}", e);
        }
    });

    // Connect to the supplicant control plane
    info!("Connecting to wpa_supplicant...");
    let manager = match InterfaceManager::connect(&config).await {
        Ok(m) => Arc::new(m),
        Err(e) => {
            error!("Failed to connect to wpa_supplicant: {}", e);
            error!("  Is the D-Bus system bus available and wpa_supplicant running?");
            return Err(e);
        }
    };

    // Start the D-Bus service
    let service = match Dot1xDbusService::start(manager.clone()).await {
        Ok(svc) => svc,
        Err(e) => {
            error!("Failed to start D-Bus service: {}", e);
            error!("  This may be due to:");
            error!("  - Another instance already running");
            error!("  - Insufficient permissions (try running as root)");
            return Err(e);
        }
    };

    info!("dot1xd is ready");
    info!("  D-Bus service: org.dot1x.Manager");
    info!("  Object path:   /org/dot1x/Manager");
    info!("  Scratch dir:   {}", config.paths.scratch_dir.display());

    // Main daemon loop
    while state.is_running().await && service.is_running().await {
        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    }

    // Cleanup: stop the service first, then tear down supplicant state.
    // Inbound requests have stopped by the time shutdown runs.
    info!("Shutting down dot1xd...");
    service.stop().await;
    manager.shutdown().await;

    info!("dot1xd stopped");
    Ok(())
}

/// Initialize logging based on command-line arguments
fn init_logging(args: &Args) {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("dot1xd={},libdot1x={}", log_level, log_level))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .init();
}

/// Handle Unix signals (SIGTERM, SIGINT)
async fn handle_signals(state: Arc<DaemonState>) -> Dot1xResult<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to register SIGTERM handler: {}", e))
        })?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to register SIGINT handler: {}", e))
        })?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
                state.stop().await;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                state.stop().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        use tokio::signal;

        signal::ctrl_c().await.map_err(|e| {
            Dot1xError::ServiceError(format!("Failed to listen for Ctrl+C: {}", e))
        })?;
        info!("Received Ctrl+C, initiating graceful shutdown");
        state.stop().await;
    }

    Ok(())
}
