//! Configuration file watcher for hot reload.
//!
//! Wraps a `notify` watcher on the single config path and turns raw
//! file-system events into [`WatchEvent`]s on a channel. Editors that save by
//! rename or delete-and-recreate detach the watch from the path, so the
//! watcher runs a small state machine:
//!
//! ```text
//! Watching ──(Renamed / Created)──▶ Resubscribing ──(watch re-added)──▶ Watching
//!                                        │    ▲
//!                                        └────┘ file still absent: retry later
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Default pause after rename/create before the file is read again.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Attempts made to re-register the watch before giving up.
const RESUBSCRIBE_ATTEMPTS: u32 = 10;

/// A change notification for the watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Contents written in place.
    Modified,
    /// Moved away or removed; the watch must be re-registered.
    Renamed,
    /// (Re)created at the path; the watch must be re-registered.
    Created,
    /// The backend reported a transient error.
    Error(String),
}

impl WatchEvent {
    /// Map a raw `notify` event, dropping kinds that never change contents.
    pub fn classify(event: &Event) -> Option<Self> {
        match event.kind {
            EventKind::Modify(ModifyKind::Name(_)) => Some(WatchEvent::Renamed),
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                Some(WatchEvent::Modified)
            }
            EventKind::Create(_) => Some(WatchEvent::Created),
            EventKind::Remove(_) => Some(WatchEvent::Renamed),
            _ => None,
        }
    }

    /// Whether the watch must be re-registered before reloading.
    pub fn needs_resubscribe(&self) -> bool {
        matches!(self, WatchEvent::Renamed | WatchEvent::Created)
    }
}

/// Error type for the watch subsystem. Never fatal to a running server.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
    #[error("could not re-watch {} after {attempts} attempts", path.display())]
    Resubscribe { path: PathBuf, attempts: u32 },
}

/// Where the watcher is in its re-registration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Watching,
    Resubscribing,
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    inner: RecommendedWatcher,
    settle: Duration,
    state: WatchState,
}

impl ConfigWatcher {
    /// Start watching `path`.
    ///
    /// Returns the watcher and a receiver for change notifications. The
    /// watcher must be kept alive for events to keep flowing.
    pub fn new(path: &Path) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => WatchEvent::classify(&event),
                    Err(e) => Some(WatchEvent::Error(e.to_string())),
                };
                if let Some(event) = event {
                    let _ = tx.send(event);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let mut watcher = Self {
            path: path.to_path_buf(),
            inner,
            settle: DEFAULT_SETTLE_DELAY,
            state: WatchState::Watching,
        };
        watcher.inner.watch(&watcher.path, RecursiveMode::NonRecursive)?;

        tracing::debug!(path = %watcher.path.display(), "Watching config file");
        Ok((watcher, rx))
    }

    /// Override the stabilization delay used around re-registration.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle
    }

    /// Re-register the watch on the path after a rename or recreate.
    ///
    /// Waits the stabilization delay first, then retries a bounded number of
    /// times while the file is absent. If the file never shows up the
    /// watcher stays in `Resubscribing`; call [`try_resubscribe`] later.
    ///
    /// [`try_resubscribe`]: ConfigWatcher::try_resubscribe
    pub async fn resubscribe(&mut self) -> Result<(), WatchError> {
        self.state = WatchState::Resubscribing;
        tracing::debug!(path = %self.path.display(), "Re-registering config watch");

        // The old registration may already be gone with the old inode.
        let _ = self.inner.unwatch(&self.path);

        for attempt in 1..=RESUBSCRIBE_ATTEMPTS {
            tokio::time::sleep(self.settle).await;
            match self.inner.watch(&self.path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    tracing::debug!(path = %self.path.display(), attempt, "Watching config file");
                    self.state = WatchState::Watching;
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(path = %self.path.display(), attempt, error = %e, "Config file not watchable yet");
                }
            }
        }

        Err(WatchError::Resubscribe {
            path: self.path.clone(),
            attempts: RESUBSCRIBE_ATTEMPTS,
        })
    }

    /// One immediate attempt to re-register a watch left in `Resubscribing`.
    ///
    /// Returns `Ok(true)` once the path is watched again, `Ok(false)` while
    /// the file is still absent.
    pub fn try_resubscribe(&mut self) -> Result<bool, WatchError> {
        if self.state == WatchState::Watching {
            return Ok(true);
        }

        if !self.path.exists() {
            return Ok(false);
        }

        match self.inner.watch(&self.path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Config file is back; watching again");
                self.state = WatchState::Watching;
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }
}
