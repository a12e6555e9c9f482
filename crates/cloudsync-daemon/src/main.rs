//! CloudSync Daemon - Background synchronization service
//!
//! This binary mirrors a local directory into the user's MOVEit home folder:
//! - Loads the YAML configuration and resolves credentials
//! - Builds the remote file index from the home folder listing
//! - Watches the sync root and uploads/deletes files as they change
//! - Shuts down gracefully on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! ```text
//! FileWatcher ──→ SyncCoordinator ──→ SyncEngine ──→ AuthenticatingTransport ──→ MOVEit
//!                                                         │
//!                                                    TokenManager
//! ```
//!
//! The coordinator loop is controlled by a `CancellationToken` that is
//! triggered on receipt of SIGTERM or SIGINT.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cloudsync_api::{AuthenticatingTransport, MoveItClient, TokenManager};
use cloudsync_core::config::Config;
use cloudsync_core::ports::{Credentials, IRemoteApi};
use cloudsync_sync::coordinator::SyncCoordinator;
use cloudsync_sync::engine::{SyncEngine, SyncEngineOptions};
use cloudsync_sync::watcher::FileWatcher;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the account password
const PASSWORD_ENV: &str = "CLOUDSYNC_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "cloudsyncd", version, about = "One-way sync of a local directory to MOVEit")]
struct Args {
    /// Use alternate config file
    #[arg(long, env = "CLOUDSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Directory to watch (overrides `sync.root`)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Account username (overrides `auth.username`)
    #[arg(long, env = "CLOUDSYNC_USERNAME")]
    username: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

// ============================================================================
// Startup
// ============================================================================

/// Loads the configuration and applies command-line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()),
    };

    if let Some(root) = &args.root {
        config.sync.root = root.clone();
    }
    if let Some(username) = &args.username {
        config.auth.username = Some(username.clone());
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }
    Ok(config)
}

/// Initializes tracing; `RUST_LOG` takes precedence over `logging.level`
fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_credentials(config: &Config) -> Result<Credentials> {
    let username = config
        .auth
        .username
        .clone()
        .filter(|u| !u.is_empty())
        .context("No username configured (set auth.username or --username)")?;
    let password = std::env::var(PASSWORD_ENV)
        .with_context(|| format!("{PASSWORD_ENV} is not set"))?;
    Ok(Credentials::new(username, password))
}

/// Builds the client → token manager → transport → engine pipeline
fn build_engine(config: &Config, credentials: Credentials) -> Arc<SyncEngine> {
    let client = MoveItClient::new(config.api.base_url.clone());
    let tokens = TokenManager::new(Arc::new(client.clone()), credentials)
        .with_tolerance(config.auth.token_expiry_tolerance());
    let transport = AuthenticatingTransport::new(client, Arc::new(tokens));

    let api: Arc<dyn IRemoteApi> = Arc::new(transport);
    Arc::new(SyncEngine::new(api, SyncEngineOptions::from(config)))
}

async fn ensure_root(root: &Path) -> Result<()> {
    if !tokio::fs::try_exists(root).await.unwrap_or(false) {
        warn!(root = %root.display(), "Sync root does not exist; creating it");
        tokio::fs::create_dir_all(root)
            .await
            .with_context(|| format!("Failed to create sync root {}", root.display()))?;
    }
    Ok(())
}

// ============================================================================
// Main loop
// ============================================================================

async fn run(config: Config, shutdown: CancellationToken) -> Result<()> {
    let credentials = resolve_credentials(&config)?;
    let root = config.sync.root.clone();
    ensure_root(&root).await?;

    info!(
        base_url = %config.api.base_url,
        username = %credentials.username,
        root = %root.display(),
        "Starting sync"
    );

    let engine = build_engine(&config, credentials);
    engine
        .initialize_with_cancellation(shutdown.child_token())
        .await
        .context("Failed to initialize sync engine")?;
    info!(
        tracked = engine.tracked_count(),
        home_folder_id = ?engine.home_folder_id(),
        "Remote index ready"
    );

    let (mut watcher, events) = FileWatcher::new().context("Failed to create file watcher")?;
    watcher
        .watch(&root)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    let coordinator = SyncCoordinator::new(engine, config.sync.dispatch_concurrency);
    coordinator.run(events, shutdown).await;

    if let Err(e) = watcher.unwatch(&root) {
        warn!(error = %e, "Failed to stop watching sync root");
    }
    Ok(())
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config.logging.level, args.json_logs);

    info!("CloudSync daemon starting (cloudsyncd)");

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let result = run(config, shutdown_token).await;

    match &result {
        Ok(()) => info!("CloudSync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "CloudSync daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
