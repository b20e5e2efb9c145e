//! Startup catch-up scan.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::convert::Converter;
use crate::stale;

/// Walk a root once at startup and convert every image whose derivatives
/// are missing or stale.
///
/// This is a one-shot catch-up pass: conversions run immediately, bypassing
/// the debounce quiet period that live events go through. Files modified
/// while the sweep runs may also be picked up by the live watcher; the
/// duplicate conversion is idempotent.
///
/// Cancellation stops the sweep before the next entry; an encoder invocation
/// already in flight finishes on its own.
pub async fn sweep_directory(root: &Path, converter: &Converter, cancel: &CancellationToken) {
    let mut converted: u64 = 0;
    let mut up_to_date: u64 = 0;

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Error walking {}: {err}", root.display());
                None
            }
        })
    {
        if cancel.is_cancelled() {
            tracing::info!(
                "Initial sweep of {} cancelled after {} conversions",
                root.display(),
                converted
            );
            return;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !stale::is_image_file(path) {
            continue;
        }

        let Some(mtime) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
            continue;
        };

        if stale::needs_conversion(path, mtime) {
            converter.convert(path).await;
            converted += 1;
        } else {
            up_to_date += 1;
        }
    }

    tracing::info!(
        "Initial sweep of {} complete: {} converted, {} up to date",
        root.display(),
        converted,
        up_to_date
    );
}
