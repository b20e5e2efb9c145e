//! Live directory watching.
//!
//! One watcher runs per configured root for the lifetime of the process.
//! Watches are registered per directory and extended when new subdirectories
//! appear, so events inside them are observed without a restart. Create and
//! write events are forwarded to the debouncer regardless of extension; the
//! conversion dispatcher filters non-images when the timer fires.

pub mod debounce;

pub use debounce::{Debouncer, QUIET_PERIOD};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

/// Watches one root directory and feeds change events into the debouncer
pub struct DirectoryWatcher {
    root: PathBuf,
    watcher: RecommendedWatcher,
    event_rx: mpsc::Receiver<Event>,
    debouncer: Debouncer,
}

impl DirectoryWatcher {
    /// Create the notify watcher and register the root plus every current
    /// subdirectory.
    ///
    /// Failure to create the watcher itself is fatal; failure to register an
    /// individual subdirectory is logged and that subdirectory is skipped.
    pub fn new(root: PathBuf, debouncer: Debouncer) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel::<Event>(256);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    // Dropped events after shutdown are fine.
                    let _ = event_tx.blocking_send(event);
                }
                Err(e) => {
                    tracing::warn!("Watch stream error: {e}");
                }
            },
        )
        .context("Failed to create file watcher")?;

        add_watches_recursively(&mut watcher, &root);

        Ok(Self {
            root,
            watcher,
            event_rx,
            debouncer,
        })
    }

    /// Process events until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Watching directory: {}", self.root.display());

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event);
                }
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("Watcher for {} stopped", self.root.display());
    }

    fn handle_event(&mut self, event: Event) {
        let created = matches!(event.kind, EventKind::Create(_));
        // Only data modifications count as "written": metadata-only changes
        // (chmod, utimes) and renames must not trigger a re-encode.
        let written = matches!(
            event.kind,
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
        );
        if !created && !written {
            return;
        }

        for path in event.paths {
            if created && path.is_dir() {
                // A new subdirectory extends the watch transitively. Files
                // already inside it at discovery time are not swept again.
                add_watches_recursively(&mut self.watcher, &path);
                continue;
            }
            self.debouncer.on_event(path);
        }
    }
}

/// Register `dir` and every subdirectory beneath it with the watcher.
///
/// Individual registration failures are logged and skipped so one bad
/// subdirectory cannot take out the rest of the tree.
fn add_watches_recursively(watcher: &mut RecommendedWatcher, dir: &Path) {
    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Error walking {}: {err}", dir.display());
                None
            }
        })
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Err(e) = watcher.watch(entry.path(), RecursiveMode::NonRecursive) {
            tracing::warn!("Failed to watch {}: {e}", entry.path().display());
        }
    }
}
