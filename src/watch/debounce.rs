//! Per-path debouncing of filesystem events.
//!
//! Editors and copy tools emit several write events while producing a single
//! file, so each raw event only (re)arms a one-shot timer for its path. The
//! timer fires one quiet period after the most recent event; an earlier
//! pending timer for the same path is cancelled, never duplicated. At most
//! one timer is outstanding per path, and timers for distinct paths are
//! independent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a path must stay quiet before its conversion fires
pub const QUIET_PERIOD: Duration = Duration::from_secs(1);

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Collapses event bursts into one delayed firing per path.
///
/// Fired paths are sent on the channel supplied at construction; the
/// conversion loop on the other end decides what to do with them.
#[derive(Clone)]
pub struct Debouncer {
    quiet_period: Duration,
    fired_tx: mpsc::Sender<PathBuf>,
    pending: Arc<Mutex<HashMap<PathBuf, PendingTimer>>>,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration, fired_tx: mpsc::Sender<PathBuf>) -> Self {
        Self {
            quiet_period,
            fired_tx,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a raw filesystem event for a path.
    ///
    /// Replaces any pending timer for the same path, so only the final event
    /// of a burst results in a firing, one quiet period later.
    pub fn on_event(&self, path: PathBuf) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        // Cancel any pending timer before arming the replacement.
        if let Some(old) = self.pending.lock().remove(&path) {
            old.handle.abort();
        }

        let quiet_period = self.quiet_period;
        let fired_tx = self.fired_tx.clone();
        let pending = self.pending.clone();
        let timer_path = path.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;

            {
                let mut map = pending.lock();
                match map.get(&timer_path) {
                    // Still the latest timer for this path: claim the entry.
                    Some(entry) if entry.generation == generation => {
                        map.remove(&timer_path);
                    }
                    // A newer event replaced this timer while it was firing.
                    _ => return,
                }
            }

            if fired_tx.send(timer_path).await.is_err() {
                tracing::debug!("Debounce timer fired after dispatcher shutdown");
            }
        });

        self.pending
            .lock()
            .insert(path, PendingTimer { generation, handle });
    }

    /// Number of paths with an outstanding timer
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
