//! Conversion dispatcher.
//!
//! Invokes the external `cwebp` and `avifenc` binaries to produce
//! `<source>.webp` and `<source>.avif` derivatives. The two invocations are
//! sequential and independent: failure of one is logged and does not prevent
//! the other, and neither failure is fatal to the process. There is no retry.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{AvifConfig, ConversionConfig, ToolsConfig, WebpConfig};
use crate::stale;

/// Result of a single dispatch for one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Path did not have a convertible image extension
    Skipped,
    /// Both encoders were attempted
    Done { webp_ok: bool, avif_ok: bool },
}

/// Runs the external encoders for a single source file
pub struct Converter {
    webp: WebpConfig,
    avif: AvifConfig,
    cwebp: PathBuf,
    avifenc: PathBuf,
}

impl Converter {
    pub fn new(conversion: ConversionConfig, tools: &ToolsConfig) -> Self {
        Self {
            webp: conversion.webp,
            avif: conversion.avif,
            cwebp: tools
                .cwebp_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("cwebp")),
            avifenc: tools
                .avifenc_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("avifenc")),
        }
    }

    /// Convert a source image into both derivative formats.
    ///
    /// No-op for paths without a jpg/png extension; live watch events are
    /// forwarded here unfiltered, so this is where non-image paths drop out.
    pub async fn convert(&self, source: &Path) -> Outcome {
        if !stale::is_image_file(source) {
            return Outcome::Skipped;
        }

        let (webp_path, avif_path) = stale::derivative_paths(source);

        let webp_ok = self
            .run_encoder("WebP", &self.cwebp, self.webp_args(source, &webp_path), &webp_path)
            .await;
        let avif_ok = self
            .run_encoder("AVIF", &self.avifenc, self.avif_args(source, &avif_path), &avif_path)
            .await;

        Outcome::Done { webp_ok, avif_ok }
    }

    fn webp_args(&self, source: &Path, dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-q".into(),
            self.webp.quality.to_string().into(),
            "-m".into(),
            self.webp.method.to_string().into(),
        ];
        if self.webp.threads {
            args.push("-mt".into());
        }
        args.push(source.into());
        args.push("-o".into());
        args.push(dest.into());
        args
    }

    fn avif_args(&self, source: &Path, dest: &Path) -> Vec<OsString> {
        vec![
            "--min".into(),
            self.avif.min_quality.to_string().into(),
            "--max".into(),
            self.avif.max_quality.to_string().into(),
            "-s".into(),
            self.avif.speed.to_string().into(),
            "--depth".into(),
            self.avif.depth.to_string().into(),
            "-j".into(),
            self.avif.threads.to_string().into(),
            source.into(),
            dest.into(),
        ]
    }

    /// Run one encoder, logging success or failure with elapsed wall time
    async fn run_encoder(
        &self,
        format: &str,
        program: &Path,
        args: Vec<OsString>,
        dest: &Path,
    ) -> bool {
        let start = Instant::now();
        let result = Command::new(program).args(&args).output().await;
        let elapsed = start.elapsed();

        match result {
            Ok(output) if output.status.success() => {
                tracing::info!(
                    "Converted {} [{}] in {:?}",
                    format,
                    dest.display(),
                    elapsed
                );
                true
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!(
                    "{} conversion failed [{}] after {:?}: exit {:?}: {}",
                    format,
                    dest.display(),
                    elapsed,
                    output.status.code(),
                    stderr.trim()
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    "{} conversion failed [{}] after {:?}: {}",
                    format,
                    dest.display(),
                    elapsed,
                    e
                );
                false
            }
        }
    }
}

/// Drain fired debounce paths and dispatch conversions.
///
/// Each path gets its own task so conversions for distinct files run in
/// parallel. Cancellation stops dispatching new work; conversions already
/// in flight are left to finish on their own.
pub async fn run_conversion_loop(
    mut fired_rx: mpsc::Receiver<PathBuf>,
    converter: Arc<Converter>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            path = fired_rx.recv() => {
                let Some(path) = path else { break };
                let converter = converter.clone();
                tokio::spawn(async move {
                    converter.convert(&path).await;
                });
            }
            _ = cancel.cancelled() => break,
        }
    }

    tracing::info!("Conversion dispatcher stopped");
}

/// Availability report for one external tool
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub available: bool,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

/// Check that the configured encoder binaries can be found and report
/// their versions.
pub fn check_tools(tools: &ToolsConfig) -> Vec<ToolStatus> {
    let cwebp = resolve_tool("cwebp", tools.cwebp_path.as_deref(), "-version");
    let avifenc = resolve_tool("avifenc", tools.avifenc_path.as_deref(), "--version");
    vec![cwebp, avifenc]
}

fn resolve_tool(name: &'static str, configured: Option<&Path>, version_flag: &str) -> ToolStatus {
    let path = match configured {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(_) => None,
        None => which::which(name).ok(),
    };

    let version = path.as_ref().and_then(|p| {
        std::process::Command::new(p)
            .arg(version_flag)
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    });

    ToolStatus {
        name,
        available: path.is_some(),
        path,
        version,
    }
}
