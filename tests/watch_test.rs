//! End-to-end tests for the live watch pipeline: filesystem event ->
//! debounce -> conversion dispatch.
//!
//! These use real filesystem notifications and a short quiet period, so they
//! poll with generous deadlines rather than asserting exact timing.

#![cfg(unix)]

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pixpress::convert::{self, Converter};
use pixpress::watch::{Debouncer, DirectoryWatcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DEADLINE: Duration = Duration::from_secs(10);

struct Pipeline {
    cancel: CancellationToken,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Pipeline {
    /// Start a watcher, debouncer, and conversion loop over `root`
    fn start(root: PathBuf, converter: Arc<Converter>) -> Self {
        let (fired_tx, fired_rx) = mpsc::channel::<PathBuf>(64);
        let debouncer = Debouncer::new(Duration::from_millis(200), fired_tx);
        let watcher = DirectoryWatcher::new(root, debouncer).unwrap();

        let cancel = CancellationToken::new();
        let handles = vec![
            tokio::spawn(watcher.run(cancel.clone())),
            tokio::spawn(convert::run_conversion_loop(
                fired_rx,
                converter,
                cancel.clone(),
            )),
        ];
        Self { cancel, handles }
    }

    async fn stop(self) {
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn file_write_triggers_conversion() {
    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let converter = Arc::new(common::fake_converter(tools.path()));

    let pipeline = Pipeline::start(root.path().to_path_buf(), converter);

    // Give the watcher time to register before generating events.
    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::write(root.path().join("pic.jpg"), b"jpeg").unwrap();

    assert!(common::wait_for(&root.path().join("pic.jpg.webp"), DEADLINE).await);
    assert!(common::wait_for(&root.path().join("pic.jpg.avif"), DEADLINE).await);

    pipeline.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn write_in_new_subdirectory_triggers_conversion() {
    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let converter = Arc::new(common::fake_converter(tools.path()));

    let pipeline = Pipeline::start(root.path().to_path_buf(), converter);

    tokio::time::sleep(Duration::from_millis(300)).await;

    // Create a subdirectory after the watch is live, then write inside it.
    let sub = root.path().join("incoming");
    fs::create_dir(&sub).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    fs::write(sub.join("dropped.png"), b"png").unwrap();

    assert!(common::wait_for(&sub.join("dropped.png.webp"), DEADLINE).await);
    assert!(common::wait_for(&sub.join("dropped.png.avif"), DEADLINE).await);

    pipeline.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn metadata_only_changes_do_not_reconvert() {
    use std::os::unix::fs::PermissionsExt;

    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let converter = Arc::new(common::fake_converter(tools.path()));

    let pipeline = Pipeline::start(root.path().to_path_buf(), converter);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let src = root.path().join("pic.jpg");
    fs::write(&src, b"jpeg").unwrap();

    let webp = root.path().join("pic.jpg.webp");
    assert!(common::wait_for(&webp, DEADLINE).await);

    // Let trailing timers drain, then plant a marker in the derivative; a
    // spurious re-encode would truncate it back to empty.
    tokio::time::sleep(Duration::from_millis(500)).await;
    fs::write(&webp, b"marker").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // chmod is a metadata-only change and must not count as a write.
    fs::set_permissions(&src, fs::Permissions::from_mode(0o600)).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(fs::read(&webp).unwrap(), b"marker");

    pipeline.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn unreadable_subdirectory_is_skipped_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let converter = Arc::new(common::fake_converter(tools.path()));

    // One subdirectory the watcher cannot register, one it can.
    let locked = root.path().join("locked");
    let open = root.path().join("open");
    fs::create_dir(&locked).unwrap();
    fs::create_dir(&open).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Registration failure on `locked` is logged and skipped; the watcher
    // itself still comes up and covers the rest of the tree.
    let pipeline = Pipeline::start(root.path().to_path_buf(), converter);

    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::write(open.join("ok.jpg"), b"jpeg").unwrap();

    assert!(common::wait_for(&open.join("ok.jpg.webp"), DEADLINE).await);
    assert!(common::wait_for(&open.join("ok.jpg.avif"), DEADLINE).await);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    pipeline.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn non_image_files_are_ignored() {
    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let converter = Arc::new(common::fake_converter(tools.path()));

    let pipeline = Pipeline::start(root.path().to_path_buf(), converter);

    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::write(root.path().join("notes.txt"), b"text").unwrap();
    fs::write(root.path().join("real.jpg"), b"jpeg").unwrap();

    // The image converting proves the pipeline ran; the text file must not
    // have gained derivatives along the way.
    assert!(common::wait_for(&root.path().join("real.jpg.webp"), DEADLINE).await);
    assert!(!root.path().join("notes.txt.webp").exists());
    assert!(!root.path().join("notes.txt.avif").exists());

    pipeline.stop().await;
}
