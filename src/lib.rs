//! Pixpress - image derivative generation daemon
//!
//! Watches configured directories for JPEG/PNG files and produces WebP and
//! AVIF derivatives alongside each source by invoking the external `cwebp`
//! and `avifenc` encoders.

pub mod config;
pub mod convert;
pub mod stale;
pub mod sweep;
pub mod watch;
