use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod dashboard;
mod error;
mod extractor;
mod filter;
mod indicators;
mod loader;
mod models;
mod schema;
mod server;
mod store;
mod synthetic;

use config::{ExtractionRequest, LoaderConfig, ServerConfig};
use extractor::{ExtractionOutcome, FileSource, RecordSource, StubSource};
use filter::{DashboardContext, FilterChange};
use loader::DataLoader;
use models::FilterState;

#[derive(Parser)]
#[command(name = "sus-dashboard")]
#[command(about = "Hospital admissions dashboard backed by a local SUS data API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records into the records store
    Extract {
        #[arg(long, default_value = "RS")]
        region: String,
        #[arg(long, default_value_t = 2023)]
        year: i32,
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
        /// Read rows from a local JSON file instead of the (disabled) download
        #[arg(long)]
        from_file: Option<PathBuf>,
        #[arg(long, env = "SUS_STORE_PATH", default_value = config::DEFAULT_STORE_PATH)]
        store: PathBuf,
    },
    /// Serve the records store over HTTP
    Serve {
        #[arg(long, env = "SUS_HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "SUS_PORT", default_value_t = 8000)]
        port: u16,
        #[arg(long, env = "SUS_STORE_PATH", default_value = config::DEFAULT_STORE_PATH)]
        store: PathBuf,
    },
    /// Load data once and render the dashboard
    Dashboard {
        #[arg(long, env = "SUS_API_URL", default_value = config::DEFAULT_API_URL)]
        api_url: String,
        #[arg(long, env = "SUS_TIMEOUT_SECS", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
        /// Days of synthetic data when the API has none
        #[arg(
            long,
            env = "SUS_SPAN_DAYS",
            default_value_t = config::DEFAULT_SPAN_DAYS,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(synthetic::MAX_SPAN_DAYS))
        )]
        span_days: u32,
        #[arg(long, value_parser = parse_cli_date)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_cli_date)]
        end: Option<NaiveDate>,
        #[arg(long, default_value = config::ALL_REGIONS)]
        region: String,
        /// Write the report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write the daily series as CSV
        #[arg(long)]
        series_csv: Option<PathBuf>,
        /// Read filter changes from stdin after the first render
        #[arg(long)]
        interactive: bool,
    },
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    schema::parse_date(s).ok_or_else(|| format!("invalid date: {s}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            region,
            year,
            month,
            from_file,
            store,
        } => {
            let request = ExtractionRequest {
                region,
                year,
                month,
            };
            let source: Box<dyn RecordSource> = match from_file {
                Some(path) => Box::new(FileSource::new(path)),
                None => Box::new(StubSource),
            };
            match extractor::run_extraction(source.as_ref(), &request, &store).await? {
                ExtractionOutcome::Stored { rows } => {
                    println!("Stored {rows} records in {}.", store.display());
                }
                ExtractionOutcome::Failed { message } => {
                    println!(
                        "Extraction failed; error status written to {}: {message}",
                        store.display()
                    );
                }
            }
        }
        Commands::Serve { host, port, store } => {
            server::run(ServerConfig {
                host,
                port,
                store_path: store,
            })
            .await?;
        }
        Commands::Dashboard {
            api_url,
            timeout_secs,
            span_days,
            start,
            end,
            region,
            out,
            series_csv,
            interactive,
        } => {
            let loader = DataLoader::new(LoaderConfig {
                api_url,
                timeout: Duration::from_secs(timeout_secs),
                span_days,
            })
            .context("failed to build HTTP client")?;

            let today = chrono::Local::now().date_naive();
            let dataset = loader.load_active(today, &mut rand::thread_rng()).await;

            let initial = FilterState {
                start,
                end,
                region: filter::region_selection(&region),
            };
            let mut ctx = DashboardContext::new(Arc::new(dataset), initial);
            info!(
                kind = ctx.dataset().kind().label(),
                rows = ctx.dataset().len(),
                span_days = loader.config().span_days,
                "dataset ready"
            );

            let report = dashboard::build_report(&ctx);
            match &out {
                Some(path) => {
                    std::fs::write(path, &report)
                        .with_context(|| format!("write report to {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{report}"),
            }

            if let Some(path) = &series_csv {
                let (_, series) = indicators::compute(&ctx.view());
                dashboard::write_series_csv(path, &series)
                    .with_context(|| format!("write series to {}", path.display()))?;
                println!("Series written to {}.", path.display());
            }

            if interactive {
                run_interactive(&mut ctx).await?;
            }
        }
    }

    Ok(())
}

/// One filter change per line; cards are recomputed after each.
async fn run_interactive(ctx: &mut DashboardContext) -> anyhow::Result<()> {
    println!("Filter commands: start DATE | end DATE | region VALUE|all | clear | show | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "show" => print!("{}", dashboard::build_report(ctx)),
            command => match command.parse::<FilterChange>() {
                Ok(change) => {
                    let cards = ctx.apply(change);
                    println!("{}", cards.slots().join(" | "));
                }
                Err(e) => warn!("{e}"),
            },
        }
    }

    Ok(())
}
