//! Gallery Index CLI
//!
//! Serves configured directory roots as a media index and prints the
//! gallery views the library computes: album list, date-sectioned
//! timeline, or one bucket's contents.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gallery_index::i18n::Strings;
use gallery_index::{
    BucketId, ContentIndex, FsIndex, IndexConfig, MediaLibrary, SectionEntry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "gallery-index")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// CLI arguments override config file settings.
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Directory roots to scan for media files
    #[arg(short, long, num_args = 1..)]
    root: Option<Vec<PathBuf>>,

    /// Name used for folders without a display name
    #[arg(long)]
    device_label: Option<String>,

    /// Number of threads for parallel scanning (0 = auto)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    json_log: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all albums with counts and thumbnails
    Albums,
    /// Print the date-sectioned timeline
    Timeline,
    /// Print the contents of one bucket
    ///
    /// BUCKET is favorites, trash, photos, videos, all, or a numeric
    /// folder bucket id.
    Bucket { bucket: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Gallery Index starting");

    let config = load_config(&cli)?;
    let device_label = config
        .device_label
        .clone()
        .unwrap_or_else(|| Strings::unknown_folder().to_string());

    let index = Arc::new(FsIndex::new(config)?);
    let scanner = Arc::clone(&index);
    let count = tokio::task::spawn_blocking(move || scanner.scan())
        .await
        .context("scan task panicked")??;
    info!(count, "Media files indexed");

    let library = MediaLibrary::with_device_label(index as Arc<dyn ContentIndex>, device_label);

    match &cli.command {
        Command::Albums => print_albums(&library, cli.json).await,
        Command::Timeline => print_timeline(&library, cli.json).await,
        Command::Bucket { bucket } => {
            let bucket = parse_bucket(bucket)?;
            print_bucket(&library, bucket, cli.json).await
        }
    }
}

async fn print_albums(library: &MediaLibrary, json: bool) -> Result<()> {
    let mut live = library.observe_albums();
    let albums = live.ready().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&*albums)?);
        return Ok(());
    }
    if albums.is_empty() {
        println!("{}", Strings::no_media());
        return Ok(());
    }
    println!("{}", Strings::albums_heading());
    for album in albums.iter() {
        let thumbnail = album
            .thumbnail
            .as_ref()
            .map(|r| r.display_name.as_str())
            .unwrap_or("-");
        println!(
            "  {:<24} {:>5} {}  [{}]",
            album.name,
            album.count,
            Strings::items_suffix(),
            thumbnail
        );
    }
    Ok(())
}

async fn print_timeline(library: &MediaLibrary, json: bool) -> Result<()> {
    let mut live = library.observe_timeline();
    let entries = live.ready().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&*entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("{}", Strings::no_media());
        return Ok(());
    }
    println!("{}", Strings::timeline_heading());
    for entry in entries.iter() {
        match entry {
            SectionEntry::Header { date } => println!("── {date} ──"),
            SectionEntry::Media { record } => {
                println!("  {}  {}", record.display_name, record.mime)
            }
        }
    }
    Ok(())
}

async fn print_bucket(library: &MediaLibrary, bucket: BucketId, json: bool) -> Result<()> {
    let mut live = library.observe_bucket(bucket);
    let records = live.ready().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&*records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("{}", Strings::no_media());
        return Ok(());
    }
    for record in records.iter() {
        println!(
            "  {}  {}  {}x{}",
            record.display_name, record.mime, record.width, record.height
        );
    }
    Ok(())
}

fn parse_bucket(name: &str) -> Result<BucketId> {
    Ok(match name.to_lowercase().as_str() {
        "favorites" => BucketId::Favorites,
        "trash" => BucketId::Trash,
        "photos" => BucketId::Photos,
        "videos" => BucketId::Videos,
        "all" => BucketId::All,
        other => match other.parse::<i64>() {
            Ok(id) => BucketId::Folder(id),
            Err(_) => bail!("unknown bucket '{name}'"),
        },
    })
}

/// Load configuration from file, then apply CLI overrides
fn load_config(cli: &Cli) -> Result<IndexConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!(config_file = %path.display(), "Loading configuration from file");
            IndexConfig::load_from_file(path)?
        }
        None => IndexConfig::default(),
    };
    if let Some(roots) = &cli.root {
        config.roots = roots.clone();
    }
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    if cli.device_label.is_some() {
        config.device_label = cli.device_label.clone();
    }
    if config.roots.is_empty() {
        bail!("no scan roots; use -r/--root or set roots in the config file");
    }
    Ok(config)
}

/// Setup logging: stderr always, optional file layer
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(log_path) = &cli.log_file {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        if cli.json_log {
            subscriber
                .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        } else {
            subscriber
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        Ok(Some(guard))
    } else if cli.json_log {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
        Ok(None)
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        Ok(None)
    }
}
