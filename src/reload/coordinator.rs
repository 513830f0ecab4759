//! Reload coordination.
//!
//! ```text
//!            trigger                 load ok + compile        publish
//!   Idle ───────────────▶ Reloading ──────────────────▶ Published ──────▶ Idle
//!                             │
//!                             └── load failed: log, keep table ──────────▶ Idle
//! ```
//!
//! The initial load happens in [`ReloadCoordinator::bootstrap`]; its failure
//! is fatal because no table exists yet. Every later failure leaves the
//! published table untouched.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::config::{load_config, ConfigError, ConfigWatcher, WatchEvent, WatchState};
use crate::observability::metrics;
use crate::routing::{compile, CompileOptions, Dispatcher};

/// How often a watch lost to a vanished file is re-attempted.
const RESUBSCRIBE_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on settle rounds while events keep arriving.
const MAX_SETTLE_ROUNDS: u32 = 20;

/// Where the coordinator is in a reload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadState {
    Idle,
    Reloading,
    Published,
}

/// What asked for a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    FileChanged,
    Signal,
    Admin,
}

impl ReloadTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadTrigger::FileChanged => "file_changed",
            ReloadTrigger::Signal => "signal",
            ReloadTrigger::Admin => "admin",
        }
    }
}

/// Result of a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadOutcome {
    pub generation: u64,
    pub paths: usize,
    pub routes: usize,
}

/// Point-in-time view of the coordinator, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadStatus {
    pub state: ReloadState,
    pub config_path: String,
    pub generation: u64,
    pub paths: usize,
    pub routes: usize,
    pub reloads_succeeded: u64,
    pub reloads_failed: u64,
    pub last_reload_unix_secs: Option<u64>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct Record {
    state: ReloadState,
    succeeded: u64,
    failed: u64,
    last_reload: Option<SystemTime>,
    last_error: Option<String>,
}

/// Rebuilds and publishes the dispatch table when the config changes.
pub struct ReloadCoordinator {
    path: PathBuf,
    options: CompileOptions,
    dispatcher: Arc<Dispatcher>,
    /// Serializes reloads so publications never land out of order.
    serial: tokio::sync::Mutex<()>,
    record: Mutex<Record>,
}

impl ReloadCoordinator {
    /// Perform the initial load and build the first table.
    pub async fn bootstrap(path: impl Into<PathBuf>, options: CompileOptions) -> Result<Self, ConfigError> {
        let path = path.into();
        let snapshot = load_config(&path).await?;
        let table = compile(&snapshot, options);

        tracing::info!(
            path = %path.display(),
            paths = table.len(),
            routes = table.route_count(),
            "Configuration loaded"
        );
        metrics::set_route_count(table.route_count());

        Ok(Self {
            path,
            options,
            dispatcher: Arc::new(Dispatcher::new(table)),
            serial: tokio::sync::Mutex::new(()),
            record: Mutex::new(Record {
                state: ReloadState::Idle,
                succeeded: 0,
                failed: 0,
                last_reload: Some(SystemTime::now()),
                last_error: None,
            }),
        })
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ReloadState {
        self.record().state
    }

    /// Reload the file and publish a new table, or keep the current one.
    pub async fn reload(&self, trigger: ReloadTrigger) -> Result<ReloadOutcome, ConfigError> {
        let _serial = self.serial.lock().await;
        self.set_state(ReloadState::Reloading);
        tracing::debug!(trigger = trigger.as_str(), path = %self.path.display(), "Reloading config");

        let snapshot = match load_config(&self.path).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(
                    trigger = trigger.as_str(),
                    error = %e,
                    generation = self.dispatcher.generation(),
                    "Failed to reload config. Keeping current configuration."
                );
                metrics::record_reload(trigger.as_str(), e.kind());
                let mut record = self.record();
                record.failed += 1;
                record.last_error = Some(e.to_string());
                record.state = ReloadState::Idle;
                return Err(e);
            }
        };

        let table = compile(&snapshot, self.options);
        let (paths, routes) = (table.len(), table.route_count());

        self.set_state(ReloadState::Published);
        self.dispatcher.publish(table);
        let outcome = ReloadOutcome {
            generation: self.dispatcher.generation(),
            paths,
            routes,
        };

        metrics::record_reload(trigger.as_str(), "ok");
        metrics::set_route_count(outcome.routes);
        tracing::info!(
            trigger = trigger.as_str(),
            generation = outcome.generation,
            paths = outcome.paths,
            routes = outcome.routes,
            "Config reloaded"
        );

        let mut record = self.record();
        record.succeeded += 1;
        record.last_reload = Some(SystemTime::now());
        record.last_error = None;
        record.state = ReloadState::Idle;
        Ok(outcome)
    }

    pub fn status(&self) -> ReloadStatus {
        let table = self.dispatcher.snapshot();
        let record = self.record();
        ReloadStatus {
            state: record.state,
            config_path: self.path.display().to_string(),
            generation: table.generation(),
            paths: table.len(),
            routes: table.route_count(),
            reloads_succeeded: record.succeeded,
            reloads_failed: record.failed,
            last_reload_unix_secs: record
                .last_reload
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
            last_error: record.last_error.clone(),
        }
    }

    /// Drive reloads from file-watch events until shutdown.
    ///
    /// After an event the loop waits for the file to go quiet for one
    /// settle delay, folding everything that arrived into a single reload.
    /// A watch lost because the file disappeared is re-attempted
    /// periodically until the file is back. Watch errors are logged and the
    /// loop keeps going.
    pub async fn watch(
        self: Arc<Self>,
        mut watcher: ConfigWatcher,
        mut events: mpsc::UnboundedReceiver<WatchEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(path = %watcher.path().display(), "Config watcher started");

        loop {
            let resubscribing = watcher.state() == WatchState::Resubscribing;
            let first = tokio::select! {
                _ = shutdown.recv() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                _ = tokio::time::sleep(RESUBSCRIBE_RETRY_INTERVAL), if resubscribing => {
                    match watcher.try_resubscribe() {
                        Ok(true) => self.reload_on_change().await,
                        Ok(false) => {}
                        Err(e) => tracing::error!(error = %e, "Watch error"),
                    }
                    continue;
                }
            };

            let mut batch = Batch::default();
            batch.add(first);
            settle(watcher.settle_delay(), &mut events, &mut batch).await;

            if batch.resubscribe {
                tracing::debug!(path = %watcher.path().display(), "Config file replaced");
                if let Err(e) = watcher.resubscribe().await {
                    tracing::warn!(error = %e, "Config file is gone; will keep trying to watch it");
                }
                // Events from the replacement itself are covered by this reload.
                while let Ok(event) = events.try_recv() {
                    batch.add(event);
                }
            }

            if batch.reload {
                self.reload_on_change().await;
            }
        }

        tracing::info!("Config watcher stopped");
    }

    /// Reload after a file event, unless the file is empty.
    ///
    /// Writers that truncate before writing leave a zero-length file for a
    /// moment; its own follow-up event reloads the real contents. Explicit
    /// reloads still publish an empty file.
    async fn reload_on_change(&self) {
        if let Ok(meta) = tokio::fs::metadata(&self.path).await {
            if meta.len() == 0 {
                tracing::debug!(path = %self.path.display(), "Config file is empty; waiting for contents");
                return;
            }
        }
        let _ = self.reload(ReloadTrigger::FileChanged).await;
    }

    fn set_state(&self, state: ReloadState) {
        self.record().state = state;
    }

    fn record(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Wait until no event arrives for one `delay`, folding arrivals into `batch`.
async fn settle(delay: Duration, events: &mut mpsc::UnboundedReceiver<WatchEvent>, batch: &mut Batch) {
    for _ in 0..MAX_SETTLE_ROUNDS {
        tokio::time::sleep(delay).await;
        let mut quiet = true;
        while let Ok(event) = events.try_recv() {
            batch.add(event);
            quiet = false;
        }
        if quiet {
            return;
        }
    }
}

#[derive(Debug, Default)]
struct Batch {
    reload: bool,
    resubscribe: bool,
}

impl Batch {
    fn add(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Error(e) => tracing::error!(error = %e, "Watch error"),
            event => {
                self.resubscribe |= event.needs_resubscribe();
                self.reload = true;
            }
        }
    }
}
