use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Directories to sweep at startup and watch for changes
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    #[serde(default)]
    pub conversion: ConversionConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub webp: WebpConfig,

    #[serde(default)]
    pub avif: AvifConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebpConfig {
    /// Output quality, 0-100 (cwebp -q)
    #[serde(default = "default_webp_quality")]
    pub quality: u32,

    /// Compression method, 0-6; higher is slower but smaller (cwebp -m)
    #[serde(default = "default_webp_method")]
    pub method: u32,

    /// Enable multithreaded encoding (cwebp -mt)
    #[serde(default)]
    pub threads: bool,
}

fn default_webp_quality() -> u32 {
    80
}
fn default_webp_method() -> u32 {
    6
}

impl Default for WebpConfig {
    fn default() -> Self {
        Self {
            quality: default_webp_quality(),
            method: default_webp_method(),
            threads: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AvifConfig {
    /// Minimum quantizer, 0-63; lower is higher quality (avifenc --min)
    #[serde(default = "default_avif_min_quality")]
    pub min_quality: u32,

    /// Maximum quantizer, 0-63 (avifenc --max)
    #[serde(default = "default_avif_max_quality")]
    pub max_quality: u32,

    /// Encoder speed, 0-10; higher is faster (avifenc -s)
    #[serde(default = "default_avif_speed")]
    pub speed: u32,

    /// Output bit depth: 8, 10, or 12 (avifenc --depth)
    #[serde(default = "default_avif_depth")]
    pub depth: u32,

    /// Number of encoder worker threads (avifenc -j)
    #[serde(default = "default_avif_threads")]
    pub threads: u32,
}

fn default_avif_min_quality() -> u32 {
    20
}
fn default_avif_max_quality() -> u32 {
    35
}
fn default_avif_speed() -> u32 {
    6
}
fn default_avif_depth() -> u32 {
    8
}
fn default_avif_threads() -> u32 {
    4
}

impl Default for AvifConfig {
    fn default() -> Self {
        Self {
            min_quality: default_avif_min_quality(),
            max_quality: default_avif_max_quality(),
            speed: default_avif_speed(),
            depth: default_avif_depth(),
            threads: default_avif_threads(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub cwebp_path: Option<PathBuf>,

    #[serde(default)]
    pub avifenc_path: Option<PathBuf>,
}
