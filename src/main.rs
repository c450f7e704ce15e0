use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use sample_grid::app::{App, AppEvent};
use sample_grid::config::Config;
use sample_grid::feed::{FeedSource, HttpFeedSource, MemoryFeedSource};
use sample_grid::ui;
use sample_grid::util::validate_server_url;

/// Get the config directory path (~/.config/sample-grid/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("sample-grid"))
}

#[derive(Parser, Debug)]
#[command(
    name = "sample-grid",
    about = "Browse dataset samples in the terminal: click to select, double click to open"
)]
struct Args {
    /// Dataset server base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Config file (default: ~/.config/sample-grid/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Browse N generated samples instead of contacting a server
    #[arg(long, value_name = "N")]
    demo: Option<usize>,

    /// Items per page
    #[arg(long)]
    page_size: Option<u32>,

    /// Cards per grid row
    #[arg(long)]
    columns: Option<usize>,
}

/// Logs go to a file; stderr belongs to the terminal UI.
fn init_logging(config_dir: &std::path::Path) -> Result<()> {
    let log_path = config_dir.join("sample-grid.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }
    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;

    if let Some(server) = args.server {
        config.server_url = server;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(columns) = args.columns {
        config.columns = columns;
    }
    config.validate().context("Invalid settings")?;

    let source: Arc<dyn FeedSource> = match args.demo {
        Some(count) => {
            tracing::info!(count, "Using generated demo dataset");
            Arc::new(MemoryFeedSource::demo(count, config.page_size))
        }
        None => {
            let base = validate_server_url(&config.server_url)
                .with_context(|| format!("Invalid server URL '{}'", config.server_url))?;
            tracing::info!(server = %base, "Using dataset server");
            Arc::new(
                HttpFeedSource::new(base, config.page_size)
                    .context("Failed to create HTTP client")?,
            )
        }
    };

    let initial = match source.dataset().await {
        Ok(dataset) => dataset,
        Err(e) => {
            tracing::warn!(error = %e, "Initial dataset query failed");
            None
        }
    };

    let mut app = App::new(source, &config);
    app.feed.set_dataset(initial);

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::spawn_dataset_watch(&mut app, config.poll_interval(), &event_tx);

    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
