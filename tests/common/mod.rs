//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pixpress::config::Config;
use pixpress::convert::Converter;

/// Write a fake encoder script that creates its last argument, which is the
/// destination path for both cwebp-style and avifenc-style invocations.
#[cfg(unix)]
pub fn fake_encoder(dir: &Path, name: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\neval \"dest=\\${$#}\"\n: > \"$dest\"\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Converter wired to fake encoders living in `tool_dir`
#[cfg(unix)]
pub fn fake_converter(tool_dir: &Path) -> Converter {
    let mut config = Config::default();
    config.tools.cwebp_path = Some(fake_encoder(tool_dir, "cwebp"));
    config.tools.avifenc_path = Some(fake_encoder(tool_dir, "avifenc"));
    Converter::new(config.conversion, &config.tools)
}

/// Poll for a path to appear, with a deadline
pub async fn wait_for(path: &Path, deadline: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
