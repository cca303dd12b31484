use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::FmtSubscriber;

use gtools::config::Config;
use gtools::host::Host;
use gtools::plugins::{default_plugin_dir, resolve_and_load, LoadOptions, NativeBackend};

/// gtools - host for native plugin panels
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to load plugins from
    #[arg(short, long)]
    plugin_dir: Option<PathBuf>,

    /// Frame rate cap (0 disables pacing)
    #[arg(long)]
    fps: Option<u32>,

    /// Start with every plugin independently visible
    #[arg(long)]
    independent: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // The UI owns stdout; logs go to stderr or a file
    let writer = match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load_default()?,
    };

    if let Some(dir) = args.plugin_dir {
        config.plugins.directory = Some(dir);
    }
    if let Some(fps) = args.fps {
        config.host.target_fps = fps;
    }
    if args.independent {
        config.host.single_app_mode = false;
    }

    if !std::io::stdout().is_terminal() {
        eprintln!("Error: gtools must be run in an interactive terminal.");
        std::process::exit(1);
    }

    let options = LoadOptions {
        sort_by_path: config.plugins.sort_by_path,
    };
    let plugins = resolve_and_load(
        &NativeBackend,
        config.plugins.directory.clone(),
        default_plugin_dir,
        options,
    );

    let mut host = Host::new(&config, plugins);
    if let Err(e) = host.run() {
        eprintln!("\ngtools encountered an error: {}", e);
        eprintln!("\nIf the terminal display is corrupted, try running:");
        eprintln!("  reset");
        return Err(e);
    }

    Ok(())
}
