use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pixpress")]
#[command(author, version, about = "Watches directories and generates WebP/AVIF image derivatives")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep the configured directories, then watch them for changes
    Run,

    /// Convert a single image and exit
    Convert {
        /// Source image (jpg or png)
        #[arg(required = true)]
        input: PathBuf,
    },

    /// Check that the encoder binaries are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
