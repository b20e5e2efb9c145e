//! Staleness checks for derivative files.
//!
//! A derivative is current only when it exists and its modification time is
//! strictly after the source's. A stat failure on a derivative counts as
//! "not current", never as an error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Check whether a path has a convertible image extension (jpg/png, any case)
pub fn is_image_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "jpg" || ext == "png"
        }
        None => false,
    }
}

/// Derivative paths for a source file: `<source>.webp` and `<source>.avif`.
///
/// The format extension is appended to the full source filename, so
/// `photo.jpg` maps to `photo.jpg.webp`, not `photo.webp`.
pub fn derivative_paths(source: &Path) -> (PathBuf, PathBuf) {
    let mut webp = OsString::from(source.as_os_str());
    webp.push(".webp");
    let mut avif = OsString::from(source.as_os_str());
    avif.push(".avif");
    (PathBuf::from(webp), PathBuf::from(avif))
}

/// Modification time of a file, or None if it cannot be stat'd
fn mod_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Decide whether a source file needs (re-)conversion.
///
/// Returns false only when both derivatives exist and are strictly newer
/// than the source. A missing or stale derivative of either format triggers
/// re-conversion of both, since the dispatcher always produces the pair.
pub fn needs_conversion(source: &Path, source_mtime: SystemTime) -> bool {
    if !is_image_file(source) {
        return false;
    }

    let (webp_path, avif_path) = derivative_paths(source);

    let webp_newer = mod_time(&webp_path).is_some_and(|t| t > source_mtime);
    let avif_newer = mod_time(&avif_path).is_some_and(|t| t > source_mtime);

    !(webp_newer && avif_newer)
}
