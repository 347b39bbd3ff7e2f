//! Auto-save: a debounce timer plus a background writer thread.
//!
//! `AutoSaver` does NOT own a thread. It is a stateful timer the editor
//! polls: every mutation calls `mark_dirty()`, which restarts the quiet
//! period, and once `should_save()` reports `true` the caller serializes the
//! project and hands it to a [`BackgroundSaver`].
//!
//! `BackgroundSaver` owns a named thread fed through a crossbeam channel.
//! Submitting never blocks. When several snapshots queue up the thread only
//! writes the newest. Write failures are reported on an error channel and
//! never touch in-memory state.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use rk_common::{EditorConfig, EngineError, ProjectStore};
use tracing::{debug, info, warn};

use crate::error::{ProjectError, ProjectResult};

/// Default quiet period before an auto-save, in seconds.
pub const DEFAULT_DEBOUNCE_SECS: f64 = 1.0;

/// Debounced dirty-state tracking.
#[derive(Debug)]
pub struct AutoSaver {
    /// Quiet period required after the last change.
    debounce: Duration,
    /// When the most recent unsaved change happened, if any.
    dirty_since: Option<Instant>,
    enabled: bool,
}

impl AutoSaver {
    /// Create a new auto-saver with the given quiet period in seconds.
    ///
    /// Negative or non-finite values fall back to the default.
    pub fn new(debounce_secs: f64) -> Self {
        let secs = if debounce_secs.is_finite() && debounce_secs >= 0.0 {
            debounce_secs
        } else {
            DEFAULT_DEBOUNCE_SECS
        };
        info!(debounce_secs = secs, "AutoSaver initialized");
        Self {
            debounce: Duration::from_secs_f64(secs),
            dirty_since: None,
            enabled: true,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.autosave_debounce_secs)
    }

    /// Record a change. Restarts the quiet period.
    pub fn mark_dirty(&mut self) {
        self.mark_dirty_at(Instant::now());
    }

    pub fn mark_dirty_at(&mut self, now: Instant) {
        if self.dirty_since.is_none() {
            debug!("Project marked as dirty");
        }
        self.dirty_since = Some(now);
    }

    /// Clear the dirty flag after a snapshot has been handed off.
    pub fn mark_saved(&mut self) {
        self.dirty_since = None;
        debug!("Project marked as saved");
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Whether a save is due now.
    pub fn should_save(&self) -> bool {
        self.should_save_at(Instant::now())
    }

    /// Whether a save is due at `now`: enabled, dirty, and quiet for at
    /// least the debounce period.
    pub fn should_save_at(&self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        match self.dirty_since {
            Some(changed) => now.saturating_duration_since(changed) >= self.debounce,
            None => false,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Enable or disable auto-saving. Dirty state is kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        debug!(enabled, "AutoSave enabled state changed");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Time remaining until a save would be due, or `None` when clean.
    pub fn time_until_save(&self) -> Option<Duration> {
        self.dirty_since
            .map(|changed| self.debounce.saturating_sub(changed.elapsed()))
    }
}

impl Default for AutoSaver {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_SECS)
    }
}

/// Commands accepted by the saver thread.
#[derive(Debug)]
enum SaveRequest {
    Save(String),
    Shutdown,
}

/// Writes serialized snapshots to a [`ProjectStore`] on a dedicated thread.
pub struct BackgroundSaver {
    request_tx: Option<Sender<SaveRequest>>,
    error_rx: Receiver<EngineError>,
    handle: Option<thread::JoinHandle<()>>,
}

impl BackgroundSaver {
    /// Spawn the saver thread writing into `store`.
    pub fn spawn(store: Arc<dyn ProjectStore>) -> ProjectResult<Self> {
        let (request_tx, request_rx) = channel::unbounded();
        let (error_tx, error_rx) = channel::unbounded();

        let handle = thread::Builder::new()
            .name("project-saver".into())
            .spawn(move || saver_thread_main(store, request_rx, error_tx))?;

        info!("BackgroundSaver started");
        Ok(Self {
            request_tx: Some(request_tx),
            error_rx,
            handle: Some(handle),
        })
    }

    /// Queue a snapshot for writing. Never blocks.
    pub fn submit(&self, serialized: String) -> ProjectResult<()> {
        let tx = self.request_tx.as_ref().ok_or(ProjectError::SaverStopped)?;
        tx.send(SaveRequest::Save(serialized))
            .map_err(|_| ProjectError::SaverStopped)
    }

    /// Drain write failures reported since the last call.
    pub fn take_errors(&self) -> Vec<EngineError> {
        self.error_rx.try_iter().collect()
    }

    /// Flush pending snapshots and join the thread.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.request_tx.take() {
            let _ = tx.send(SaveRequest::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("BackgroundSaver thread panicked");
            }
            debug!("BackgroundSaver stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for BackgroundSaver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn saver_thread_main(
    store: Arc<dyn ProjectStore>,
    request_rx: Receiver<SaveRequest>,
    error_tx: Sender<EngineError>,
) {
    let write = |snapshot: &str| {
        if let Err(e) = store.save(snapshot) {
            warn!(error = %e, "Background save failed");
            let _ = error_tx.send(e);
        } else {
            debug!(bytes = snapshot.len(), "Background save complete");
        }
    };

    while let Ok(request) = request_rx.recv() {
        let mut latest = match request {
            SaveRequest::Save(snapshot) => Some(snapshot),
            SaveRequest::Shutdown => None,
        };
        let mut shutdown = latest.is_none();

        // Coalesce everything already queued down to the newest snapshot.
        loop {
            match request_rx.try_recv() {
                Ok(SaveRequest::Save(snapshot)) => latest = Some(snapshot),
                Ok(SaveRequest::Shutdown) => shutdown = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    shutdown = true;
                    break;
                }
            }
        }

        if let Some(snapshot) = latest {
            write(&snapshot);
        }
        if shutdown {
            break;
        }
    }
    debug!("Saver thread exiting");
}
