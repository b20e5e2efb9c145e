mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tokio_util::sync::CancellationToken;

use pixpress::{config, convert, stale, sweep, watch};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick a default from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "pixpress=trace".to_string()
        } else {
            "pixpress=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run(cli.config.as_deref()))
        }
        Commands::Convert { input } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_single(&input, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("pixpress {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Sweep every configured directory once, then watch them until Ctrl-C.
async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if config.directories.is_empty() {
        tracing::warn!("No directories configured; nothing to watch");
    }

    let converter = Arc::new(convert::Converter::new(
        config.conversion.clone(),
        &config.tools,
    ));

    // Fired debounce timers land on this channel; the conversion loop
    // drains it for as long as the process runs.
    let (fired_tx, fired_rx) = tokio::sync::mpsc::channel::<PathBuf>(256);
    let debouncer = watch::Debouncer::new(watch::QUIET_PERIOD, fired_tx);

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    let loop_converter = converter.clone();
    let loop_cancel = cancel.clone();
    tasks.push(tokio::spawn(async move {
        convert::run_conversion_loop(fired_rx, loop_converter, loop_cancel).await;
    }));

    for dir in &config.directories {
        // Watcher creation happens before any task is spawned for this root
        // so an initialization failure aborts startup.
        let watcher = watch::DirectoryWatcher::new(dir.clone(), debouncer.clone())?;
        tasks.push(tokio::spawn(watcher.run(cancel.clone())));

        let sweep_dir = dir.clone();
        let sweep_converter = converter.clone();
        let sweep_cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            sweep::sweep_directory(&sweep_dir, &sweep_converter, &sweep_cancel).await;
        }));
    }

    tracing::info!("pixpress running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    cancel.cancel();
    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}

async fn convert_single(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let converter = convert::Converter::new(config.conversion, &config.tools);

    match converter.convert(input).await {
        convert::Outcome::Skipped => {
            println!("Not a jpg/png image: {}", input.display());
        }
        convert::Outcome::Done { webp_ok, avif_ok } => {
            let (webp, avif) = stale::derivative_paths(input);
            println!(
                "WebP [{}]: {}",
                webp.display(),
                if webp_ok { "ok" } else { "failed" }
            );
            println!(
                "AVIF [{}]: {}",
                avif.display(),
                if avif_ok { "ok" } else { "failed" }
            );
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = convert::check_tools(&config.tools);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All encoders are available!");
    } else {
        println!("Some encoders are missing. Install the libwebp and libavif tools to enable conversion.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Directories: {}", config.directories.len());
            for dir in &config.directories {
                println!("    {}", dir.display());
            }
            let webp = &config.conversion.webp;
            println!(
                "  WebP: quality {} method {}{}",
                webp.quality,
                webp.method,
                if webp.threads { " multithreaded" } else { "" }
            );
            let avif = &config.conversion.avif;
            println!(
                "  AVIF: quantizer {}-{} speed {} depth {} threads {}",
                avif.min_quality, avif.max_quality, avif.speed, avif.depth, avif.threads
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            let webp = &config.conversion.webp;
            println!("Default config:");
            println!("  WebP: quality {} method {}", webp.quality, webp.method);
            let avif = &config.conversion.avif;
            println!(
                "  AVIF: quantizer {}-{} speed {} depth {}",
                avif.min_quality, avif.max_quality, avif.speed, avif.depth
            );
        }
    }

    Ok(())
}
