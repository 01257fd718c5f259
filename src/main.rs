//! Normativa-Scraper main entry point
//!
//! This is the command-line interface for downloading Chilean tax normative
//! documents from LeyChile and the SII.

use anyhow::Context;
use clap::{Parser, Subcommand};
use normativa_scraper::config::{load_config_or_default, Config};
use normativa_scraper::crawler::{HttpTransport, PerHostDelay, Transport};
use normativa_scraper::runs::{sii_plan, LawRun, SiiRun, LAWS_GROUP};
use normativa_scraper::shutdown::Shutdown;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Normativa-Scraper: a polite downloader for Chilean tax documents
///
/// Downloads tax laws from LeyChile and resoluciones, circulares and XML
/// schemas from the SII, then writes a JSON report of what was retrieved.
#[derive(Parser, Debug)]
#[command(name = "normativa-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Downloads Chilean tax laws and SII normative documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output root; overrides `[output] root`
    #[arg(short, long, value_name = "DIR", global = true)]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate config and show what would be downloaded without any network access
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Download tax laws from LeyChile
    Leyes,

    /// Download SII resoluciones, circulares and XML schemas
    Sii,

    /// Run both downloads, laws first
    Todo,
}

impl Command {
    fn runs_laws(self) -> bool {
        matches!(self, Command::Leyes | Command::Todo)
    }

    fn runs_sii(self) -> bool {
        matches!(self, Command::Sii | Command::Todo)
    }

    fn log_file(self) -> &'static str {
        match self {
            Command::Leyes => "leyes_scraper.log",
            Command::Sii => "sii_scraper.log",
            Command::Todo => "todo_scraper.log",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_hash) = load_config_or_default(cli.config.as_deref())
        .with_context(|| match &cli.config {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Built-in configuration is invalid".to_string(),
        })?;

    if let Some(root) = &cli.output {
        config.output.root = root.clone();
    }

    if cli.dry_run {
        setup_logging(cli.verbose, cli.quiet, None)?;
        return handle_dry_run(&config, cli.command);
    }

    bootstrap_directories(&config, cli.command)?;
    let log_path = config.output.logs_path().join(cli.command.log_file());
    setup_logging(cli.verbose, cli.quiet, Some(&log_path))?;

    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("Using built-in configuration"),
    }

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::from_config(&config.user_agent, &config.scraper)
            .context("Failed to build HTTP client")?,
    );

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    if cli.command.runs_laws() {
        handle_laws(&config, transport.clone(), shutdown.clone()).await?;
    }

    if cli.command.runs_sii() && !shutdown.is_triggered() {
        handle_sii(&config, transport, shutdown).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events go to stdout and, when `log_file` is given, are appended to it
/// without ANSI colours.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("normativa_scraper=info,warn"),
            1 => EnvFilter::new("normativa_scraper=debug,info"),
            2 => EnvFilter::new("normativa_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Creates the output root, data and log directories and every destination
fn bootstrap_directories(config: &Config, command: Command) -> anyhow::Result<()> {
    let mut dirs = vec![
        config.output.root.clone(),
        config.output.data_path(),
        config.output.logs_path(),
    ];

    if command.runs_laws() {
        dirs.push(config.output.resolve(&config.leychile.destination));
    }

    if command.runs_sii() {
        for category in &config.sii.categories {
            dirs.push(config.output.resolve(&category.name));
        }
        if config.sii.schemas.enabled {
            dirs.push(config.output.resolve(&config.sii.schemas.destination));
        }
    }

    for dir in dirs {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be downloaded
fn handle_dry_run(config: &Config, command: Command) -> anyhow::Result<()> {
    println!("=== Normativa-Scraper Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Request delay: {}ms", config.scraper.request_delay_ms);
    println!("  Law delay: {}ms", config.scraper.law_delay_ms);
    println!("  Request timeout: {}s", config.scraper.request_timeout_secs);
    println!("  Connect timeout: {}s", config.scraper.connect_timeout_secs);
    println!("  User agent: {}", config.user_agent.value);

    println!("\nOutput:");
    println!("  Root: {}", config.output.root.display());
    println!("  Reports: {}", config.output.data_path().display());
    println!("  Logs: {}", config.output.logs_path().display());

    if command.runs_laws() {
        let laws = config.leychile.catalogue();
        println!(
            "\nLaws ({}) -> {}:",
            laws.len(),
            config.output.resolve(&config.leychile.destination).display()
        );
        for law in &laws {
            println!("  - {} ({})", law.name, law.url);
        }
    }

    if command.runs_sii() {
        let year = chrono::Datelike::year(&chrono::Local::now());
        let targets = sii_plan(config, year).map_err(|e| {
            println!("\n✗ SII plan is invalid: {}", e);
            anyhow::Error::new(e).context("SII plan is invalid")
        })?;

        println!("\nSII index pages ({}):", targets.len());
        for target in &targets {
            println!(
                "  - {} {} -> {}",
                target.category,
                target.index_url,
                target.destination.display()
            );
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Runs the laws download and prints its summary
async fn handle_laws(
    config: &Config,
    transport: Arc<dyn Transport>,
    shutdown: Shutdown,
) -> anyhow::Result<()> {
    println!("🏛️  Tax laws - LeyChile.cl");
    println!("{}", "=".repeat(50));

    let limiter = Arc::new(PerHostDelay::new(config.scraper.law_delay()));
    let outcome = LawRun::new(config.clone(), transport, limiter)
        .with_shutdown(shutdown)
        .execute()
        .await
        .with_context(|| format!("Failed to complete the {} run", LAWS_GROUP))?;

    let view = &outcome.view;
    println!("\n📊 Summary:");
    println!("✅ Successful: {}", view.exitosas);
    println!("❌ Failed: {}", view.fallidas);
    println!("📁 Total: {}", view.total);
    println!("📝 Report: {}", outcome.report_path.display());

    if view.interrumpido {
        println!("\n⏹️  Interrupted before every law was processed");
    }
    if view.fallidas > 0 {
        println!("\n⚠️  Check the log for details on failed downloads");
    }

    Ok(())
}

/// Runs the SII download and prints its summary
async fn handle_sii(
    config: &Config,
    transport: Arc<dyn Transport>,
    shutdown: Shutdown,
) -> anyhow::Result<()> {
    println!("🏛️  SII normative documents");
    println!("{}", "=".repeat(40));

    let limiter = Arc::new(PerHostDelay::new(config.scraper.request_delay()));
    let outcome = SiiRun::new(config.clone(), transport, limiter)
        .with_shutdown(shutdown)
        .execute()
        .await
        .context("Failed to complete the sii run")?;

    let view = &outcome.view;
    println!("\n📊 Download summary:");
    println!("📄 Documents processed: {}", view.resumen.total_documentos);
    for (group, years) in &view.por_periodo {
        let counts: Vec<String> = years
            .iter()
            .map(|(year, count)| format!("{}: {}", year, count))
            .collect();
        println!("📁 {} by year: {{{}}}", group, counts.join(", "));
    }
    println!("📁 XML schemas: {}", view.schemas);
    println!("📝 Report: {}", outcome.report_path.display());

    if view.interrumpido {
        println!("\n⏹️  Interrupted before every category was processed");
    }
    if view.resumen.documentos_fallidos > 0 || !view.fallos.is_empty() {
        println!(
            "\n⚠️  {} failures, check the report and the log for details",
            view.fallos.len()
        );
    }

    Ok(())
}
