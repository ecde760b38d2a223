//! Sondeo - live sentiment analytics for survey snapshots
//!
//! Reads snapshots of survey submissions (demographics plus ten
//! multiple-choice answers), derives a sentiment per respondent, and writes
//! a dashboard report with grouped counts and percentages. In watch mode the
//! report is kept current against the live dataset.

mod cli;
mod config;
mod engine;
mod live;
mod models;
mod report;

use anyhow::{anyhow, Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use live::{FileSource, HttpSource, RecomputeController, SnapshotSource};
use models::DashboardFrame;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Sondeo v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sondeo.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".sondeo.toml");

    if path.exists() {
        eprintln!("⚠️  .sondeo.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .sondeo.toml")?;

    println!("✅ Created .sondeo.toml with default settings.");
    println!("   Edit it to point at your snapshot file or endpoint.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the analysis in the mode the arguments select.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.is_watch() {
        run_live(&args, &config).await
    } else {
        run_once(&args, &config).await
    }
}

/// Analyze one snapshot and write one report.
async fn run_once(args: &Args, config: &Config) -> Result<()> {
    if let Some(ref file) = config.source.file {
        let path = Path::new(file);
        println!("📥 Leyendo snapshot: {}", path.display());

        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        let snapshot = live::parse_snapshot(&text)?;

        let frame = engine::analyze(1, &snapshot);
        write_report(&frame, config, args.format)?;
        print_summary(&frame, config);
        return Ok(());
    }

    // Single fetch from the endpoint, through the same live pipeline.
    let source = build_http_source(config)?;
    let controller = RecomputeController::spawn(source.subscribe());
    let mut published = controller.published();

    loop {
        published
            .changed()
            .await
            .map_err(|_| anyhow!("Snapshot source stopped before delivering a dataset"))?;

        let current = published.borrow_and_update().clone();
        if let Some(frame) = current.frame {
            write_report(&frame, config, args.format)?;
            print_summary(&frame, config);
            break;
        }
        if let Some(failure) = current.last_failure {
            controller.stop();
            return Err(anyhow!(failure));
        }
    }

    controller.stop();
    Ok(())
}

/// Follow the source and rewrite the report on every published frame.
async fn run_live(args: &Args, config: &Config) -> Result<()> {
    let source: Box<dyn SnapshotSource> = if config.source.url.is_some() {
        Box::new(build_http_source(config)?)
    } else if let Some(ref file) = config.source.file {
        Box::new(FileSource::new(PathBuf::from(file), poll_interval(config)))
    } else {
        return Err(anyhow!(
            "No snapshot source configured; pass --input or --url"
        ));
    };

    println!("📡 Siguiendo el snapshot en vivo...");
    println!(
        "   Reporte: {} (se reescribe con cada cambio)",
        config.general.output
    );
    println!("   Ctrl-C para terminar.\n");

    let controller = RecomputeController::spawn(source.subscribe());
    let mut published = controller.published();
    let spinner = make_spinner(args.quiet);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = published.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = published.borrow_and_update().clone();

                if let Some(ref failure) = current.last_failure {
                    // Transient failure: keep serving the last good dashboard.
                    warn!("snapshot delivery failed, keeping last dashboard: {failure}");
                    spinner.set_message(format!("último error: {failure}"));
                    continue;
                }
                if let Some(ref frame) = current.frame {
                    write_report(frame, config, args.format)?;
                    spinner.set_message(format!(
                        "{} respuestas · snapshot #{}",
                        frame.respondent_count(),
                        frame.seq
                    ));
                    debug!("dashboard rewritten for snapshot {}", frame.seq);
                }
            }
        }
    }

    spinner.finish_and_clear();
    controller.stop();
    controller.join().await;

    println!(
        "\n✅ Terminado. Último dashboard en: {}",
        config.general.output
    );
    Ok(())
}

fn make_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("spinner template is valid"),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("esperando el primer snapshot...");
    spinner
}

/// Render the frame in the selected format and write it to the output path.
fn write_report(frame: &DashboardFrame, config: &Config, format: OutputFormat) -> Result<()> {
    let output = match format {
        OutputFormat::Markdown => report::generate_markdown_report(frame, &config.report),
        OutputFormat::Json => report::generate_json_report(frame)?,
    };

    std::fs::write(&config.general.output, &output)
        .with_context(|| format!("Failed to write report to {}", config.general.output))?;
    Ok(())
}

fn print_summary(frame: &DashboardFrame, config: &Config) {
    println!("\n📊 Resumen del análisis:");
    println!("   Respuestas: {}", frame.respondent_count());

    let sentiment_line = frame
        .aggregates
        .sentiment
        .buckets
        .iter()
        .map(|b| format!("{}: {} ({:.1}%)", b.label, b.count, b.percentage))
        .collect::<Vec<_>>()
        .join(" | ");
    println!("   {}", sentiment_line);

    println!("\n✅ Dashboard guardado en: {}", config.general.output);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .sondeo.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

fn build_http_source(config: &Config) -> Result<HttpSource> {
    let url = config
        .source
        .url
        .clone()
        .context("No snapshot URL configured")?;

    HttpSource::new(
        url,
        poll_interval(config),
        Duration::from_secs(config.source.timeout_seconds),
    )
}

fn poll_interval(config: &Config) -> Duration {
    Duration::from_secs(config.source.poll_interval_seconds)
}
