//! Startup orchestration.
//!
//! Order: initial config load → dispatcher → watcher → admin / metrics →
//! stub listener. Only the initial load and the stub listener bind may fail
//! startup; everything else degrades with an error log.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::admin;
use crate::config::{ConfigError, ConfigWatcher, DEFAULT_SETTLE_DELAY};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::reload::ReloadCoordinator;
use crate::routing::{CompileOptions, EmptyQueryPolicy};

/// Already-resolved process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub listen: SocketAddr,
    pub empty_query: EmptyQueryPolicy,
    pub settle_delay: Duration,
    pub watch: bool,
    pub admin_address: Option<SocketAddr>,
    pub metrics_address: Option<SocketAddr>,
}

impl Settings {
    pub fn new(config_path: impl Into<PathBuf>, listen: SocketAddr) -> Self {
        Self {
            config_path: config_path.into(),
            listen,
            empty_query: EmptyQueryPolicy::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            watch: true,
            admin_address: None,
            metrics_address: None,
        }
    }
}

/// Error type for startup. Any of these stops the process.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("initial configuration load failed: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A started server whose listeners are bound and accepting.
pub struct Running {
    pub coordinator: Arc<ReloadCoordinator>,
    pub local_addr: SocketAddr,
    pub admin_addr: Option<SocketAddr>,
    pub shutdown: Shutdown,
    server: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl Running {
    /// Wait for the stub server to stop.
    pub async fn wait(self) -> Result<(), StartupError> {
        match self.server.await {
            Ok(result) => result.map_err(StartupError::Serve),
            Err(e) => Err(StartupError::Serve(std::io::Error::other(e))),
        }
    }

    /// Trigger shutdown and wait for the stub server to stop.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        self.wait().await
    }
}

/// Load the config, bind listeners and spawn all tasks.
pub async fn start(settings: Settings) -> Result<Running, StartupError> {
    let options = CompileOptions {
        empty_query: settings.empty_query,
    };
    let coordinator = Arc::new(ReloadCoordinator::bootstrap(&settings.config_path, options).await?);
    let shutdown = Shutdown::new();

    if settings.watch {
        match ConfigWatcher::new(&settings.config_path) {
            Ok((watcher, events)) => {
                let watcher = watcher.with_settle_delay(settings.settle_delay);
                tokio::spawn(coordinator.clone().watch(watcher, events, shutdown.subscribe()));
            }
            Err(e) => {
                tracing::error!(error = %e, "Config watcher unavailable; hot reload disabled");
            }
        }
    }

    tokio::spawn(signals::reload_on_sighup(coordinator.clone(), shutdown.subscribe()));

    if let Some(addr) = settings.metrics_address {
        metrics::init_metrics(addr);
    }

    let admin_addr = match settings.admin_address {
        Some(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .map_err(|source| StartupError::Bind { addr, source })?;
            let local = listener.local_addr().map_err(StartupError::Serve)?;
            let coordinator = coordinator.clone();
            let admin_shutdown = shutdown.subscribe();
            tokio::spawn(async move {
                if let Err(e) = admin::serve_admin(listener, coordinator, admin_shutdown).await {
                    tracing::error!(error = %e, "Admin API stopped");
                }
            });
            Some(local)
        }
        None => None,
    };

    let listener = TcpListener::bind(settings.listen)
        .await
        .map_err(|source| StartupError::Bind {
            addr: settings.listen,
            source,
        })?;
    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;

    let server = HttpServer::new(coordinator.dispatcher());
    let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Ok(Running {
        coordinator,
        local_addr,
        admin_addr,
        shutdown,
        server,
    })
}
