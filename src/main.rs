//! Site-Harvester main entry point
//!
//! This is the command-line interface for the Site-Harvester website harvester.

use clap::Parser;
use site_harvester::config::{load_config_with_hash, Config, DEFAULT_CONFIG_PATH};
use site_harvester::crawler::{Coordinator, ShutdownSignal};
use site_harvester::download::DownloadTracker;
use site_harvester::output::{print_statistics, OutputLayout};
use site_harvester::url::{normalize_start_url, NormalizeOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Site-Harvester: a resumable two-phase website harvester
///
/// Site-Harvester discovers the pages of one site breadth-first up to a fixed
/// depth, then saves their readable text and downloads linked documents,
/// images and PDFs. Downloads already on record are never fetched again.
#[derive(Parser, Debug)]
#[command(name = "site-harvester")]
#[command(version)]
#[command(about = "A resumable two-phase website harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            setup_logging(cli.verbose, cli.quiet, None);
            tracing::error!(
                "Failed to load configuration from {}: {}",
                cli.config.display(),
                e
            );
            return Err(e.into());
        }
    };

    if cli.dry_run {
        setup_logging(cli.verbose, cli.quiet, None);
        return handle_dry_run(&config);
    }

    let layout = OutputLayout::new(config.base_dir.clone());
    layout.create_dirs()?;
    let log_file = open_log_file(&layout.log_file())?;
    setup_logging(cli.verbose, cli.quiet, Some(log_file));

    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    handle_crawl(config, config_hash).await
}

/// Opens the run log for appending so earlier runs stay on record
fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// The console layer follows `-v`/`-q`; the optional file layer gets the
/// same events without ANSI colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<File>) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvester=info,warn"),
            1 => EnvFilter::new("site_harvester=debug,info"),
            2 => EnvFilter::new("site_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let start = normalize_start_url(&config.start_url, &NormalizeOptions::from_config(config))?;
    let layout = OutputLayout::new(config.base_dir.clone());

    println!("=== Site-Harvester Dry Run ===\n");

    println!("Traversal:");
    println!("  Start URL: {}", start);
    println!("  Max depth: {}", config.max_depth);
    println!(
        "  Page backend: {}",
        if config.use_playwright {
            "headless browser"
        } else {
            "http"
        }
    );
    println!("  Strip query strings: {}", config.strip_query);

    println!("\nScope:");
    println!("  Host: {}", start.as_url().host_str().unwrap_or_default());
    println!("  Excluded paths ({}):", config.excluded_paths.len());
    for path in &config.excluded_paths {
        println!("    - {}", path);
    }
    match &config.language_pattern {
        Some(pattern) => println!("  Locale gate: {:?} ({:?})", pattern, config.language_mode),
        None => println!("  Locale gate: none"),
    }

    println!("\nDownloads:");
    for (category, extensions) in &config.download_extensions {
        println!("  {}: {}", category, extensions.join(" "));
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.user_agent);
    println!("  Timeout: {}s", config.request_timeout_secs);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.max_retries, config.retry_backoff_ms
    );
    println!("  Accept invalid certificates: {}", config.accept_invalid_certs);

    println!("\nOutput:");
    println!("  Base directory: {}", layout.base().display());
    println!(
        "  Tracked downloads: {}",
        tracked_downloads(&layout.tracker_file())
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would start harvesting at {}", start);

    Ok(())
}

/// Counts tracker entries without creating anything on disk
fn tracked_downloads(path: &Path) -> usize {
    if !path.exists() {
        return 0;
    }
    DownloadTracker::load(path).map(|t| t.len()).unwrap_or(0)
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config, config_hash: String) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();

    let coordinator = match Coordinator::new(config, shutdown).await {
        Ok(coordinator) => coordinator.with_config_hash(config_hash),
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            return Err(e.into());
        }
    };

    let snapshot = coordinator.run().await?;
    print_statistics(&snapshot);

    Ok(())
}
