use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use entrez_harvest::config::{get_config, load_config};
use entrez_harvest::eutils::EntrezClient;
use entrez_harvest::gate::RequestGate;
use entrez_harvest::models::BatchStatus;
use entrez_harvest::output::write_canonical_set;
use entrez_harvest::query::{partition, DateRange};
use entrez_harvest::terms;
use entrez_harvest::Harvester;

/// Harvest biomedical literature identifiers from NCBI E-utilities
#[derive(Parser, Debug)]
#[command(name = "entrez-harvest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bulk retrieval of PMC/PubMed identifiers for the device and indicator vocabularies", long_about = None)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// NCBI API key (falls back to the NCBI_API_KEY environment variable);
    /// raises the request quota from 3/s to 10/s
    #[arg(long)]
    api_key: Option<String>,

    /// Only include articles published in or after this year
    #[arg(long)]
    start_year: Option<i32>,

    /// Only include articles published in or before this year
    #[arg(long)]
    end_year: Option<i32>,

    /// Where to write the canonical identifier set
    #[arg(long, default_value = "submission_results/retrieved_ids.json")]
    output: PathBuf,

    /// Override the number of concurrent batch workers
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("entrez_harvest={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => get_config(),
    };
    if cli.api_key.is_some() {
        config.api_key = cli.api_key.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let date = match (cli.start_year, cli.end_year) {
        (None, None) => None,
        (start, end) => Some(DateRange::years(start, end)),
    };

    let start = Instant::now();
    let devices = terms::device_terms();
    let indicators = terms::indicator_terms();
    let queries = partition(&devices, &indicators, date.as_ref(), config.query_ceiling)?;
    tracing::info!(
        devices = devices.len(),
        indicators = indicators.len(),
        queries = queries.len(),
        "partitioned vocabulary query"
    );

    let gate = RequestGate::for_credential(config.api_key.as_deref());
    let client = EntrezClient::new(&config)?;
    let harvester = Harvester::new(client, gate, config.clone());

    let bar = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new((queries.len() * 2) as u64)
    };
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")?.progress_chars("=> "),
    );
    bar.set_message("batches");

    let outcome = harvester
        .run_queries(&queries, |batch| {
            bar.inc(1);
            if batch.status != BatchStatus::Succeeded {
                bar.println(format!(
                    "batch {} against {} ended {:?} ({} of {} records)",
                    batch.index, batch.db, batch.status, batch.retrieved, batch.expected
                ));
            }
        })
        .await?;
    bar.finish_and_clear();

    write_canonical_set(&cli.output, &outcome.records)?;

    let report = &outcome.report;
    tracing::info!(
        batches = report.total(),
        succeeded = report.succeeded,
        partial = report.partial,
        failed = report.failed,
        recovered = report.recovered,
        "batch accounting"
    );
    if report.is_shortfall() {
        tracing::warn!(
            expected = report.expected_total,
            retrieved = report.retrieved_total,
            "run retrieved fewer records than the API reported as available"
        );
    }
    if let Some(dedup) = &report.dedup {
        tracing::info!(
            pmc = dedup.pmc_input,
            pubmed = dedup.pubmed_input,
            canonical = dedup.canonical,
            "deduplication"
        );
    }
    tracing::info!(
        records = outcome.records.len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        output = %cli.output.display(),
        "harvest complete"
    );

    Ok(())
}
