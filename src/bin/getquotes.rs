//! Command-line entry point: fetch a quote for every configured stock.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use getquotes::config::Config;
use getquotes::pool::Schedule;
use getquotes::scrape::{run, QuoteResponse, Stock};
use getquotes::viewer::{SESSION_END, SESSION_START};

#[derive(Debug, Parser)]
#[command(name = "getquotes", about = "Retrieve stock quotes from web sites", version)]
struct Args {
    /// Configuration file.
    #[arg(short = 'c', long, default_value = "getquotes.toml")]
    config: PathBuf,

    /// Output file for the quote table; stdout when omitted.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// JSON-lines log file, consumed by the viewlog server.
    #[arg(short = 'l', long, default_value = "getquotes.log")]
    log_file: PathBuf,

    /// Shuffle the request queues instead of spreading them.
    #[arg(long)]
    random: bool,

    /// Overall timeout in seconds; cancels outstanding work when it fires.
    #[arg(short = 't', long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(error) = run_cli(args).await {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

async fn run_cli(args: Args) -> anyhow::Result<()> {
    let log_file = File::options()
        .create(true)
        .append(true)
        .open(&args.log_file)
        .with_context(|| format!("cannot open log file {}", args.log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    let run_id = Uuid::new_v4();
    info!(run_id = %run_id, "{SESSION_START}");

    let result = fetch_and_report(&args).await;

    info!(run_id = %run_id, "{SESSION_END}");
    result
}

async fn fetch_and_report(args: &Args) -> anyhow::Result<()> {
    let config = Config::load(&args.config)
        .with_context(|| format!("cannot load configuration {}", args.config.display()))?;
    let (scrapers, stocks) = config.plan()?;

    let token = CancellationToken::new();
    if let Some(secs) = args.timeout {
        let timeout = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            timeout.cancel();
        });
    }

    let schedule = if args.random {
        Schedule::Random
    } else {
        Schedule::Spread
    };
    let results = run(&token, &scrapers, &stocks, schedule).await?;

    write_table(args.output.as_deref(), &stocks, &results)
}

fn write_table(
    output: Option<&Path>,
    stocks: &[Stock],
    results: &[QuoteResponse],
) -> anyhow::Result<()> {
    let isin: HashMap<&str, &str> = stocks
        .iter()
        .map(|stock| (stock.name.as_str(), stock.isin.as_str()))
        .collect();

    let mut table = String::from("ISIN\tNAME\tPRICE\tDATE\tSCRAPER\tERROR\n");
    for res in results {
        let (price, date, error) = match &res.outcome {
            Ok(quote) => (
                format!("{:.3}", quote.price),
                quote.date.format("%d-%m-%Y").to_string(),
                String::new(),
            ),
            Err(err) => (String::new(), String::new(), err.to_string()),
        };
        let isin = isin.get(res.stock.as_str()).copied().unwrap_or("");
        table.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            isin, res.stock, price, date, res.scraper, error
        ));
    }

    match output {
        Some(path) => fs::write(path, table)
            .with_context(|| format!("cannot write output {}", path.display()))?,
        None => io::stdout().write_all(table.as_bytes())?,
    }
    Ok(())
}
