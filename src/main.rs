mod fetch;
mod ingest;
mod output;
mod parser;
mod pipeline;
mod schema;
mod settings;
mod store;

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use fetch::HttpSource;
use settings::Settings;
use store::EntityStore;

#[derive(Parser)]
#[command(
    name = "fd_scraper",
    version,
    about = "Merge the fire department directory CSV with addresses scraped from each department's detail page"
)]
struct Cli {
    /// Settings file (default: ./fd_scraper.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory CSV to read
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Write the merged CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Detail page URL; `?fdid=N` is appended
    #[arg(long)]
    base_url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Extra attempts on transient HTTP failures
    #[arg(long)]
    retries: Option<u32>,
    /// Abort on the first malformed data row instead of skipping it
    #[arg(long)]
    strict: bool,
    #[arg(long)]
    first_id: Option<u32>,
    /// Last detail page id, inclusive (default: number of departments in the CSV)
    #[arg(long)]
    last_id: Option<u32>,
    /// Validate and load the CSV, then exit without fetching
    #[arg(long)]
    check: bool,
    /// No progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn apply(&self, s: &mut Settings) {
        if let Some(ref p) = self.input {
            s.input = p.clone();
        }
        if self.output.is_some() {
            s.output = self.output.clone();
        }
        if let Some(ref url) = self.base_url {
            s.base_url = url.clone();
        }
        if let Some(t) = self.timeout {
            s.timeout_secs = t;
        }
        if let Some(r) = self.retries {
            s.retries = r;
        }
        if self.strict {
            s.strict = true;
        }
        if let Some(id) = self.first_id {
            s.first_id = id;
        }
        if self.last_id.is_some() {
            s.last_id = self.last_id;
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Validate the directory CSV named in `settings` and seed a store from it.
fn load_directory(settings: &Settings) -> anyhow::Result<EntityStore> {
    let mut store = EntityStore::new();
    let report = ingest::ingest_path(&settings.input, &mut store, settings.policy())
        .with_context(|| format!("Failed to load {:?}", settings.input))?;
    info!(
        rows = report.data_rows,
        seeded = report.seeded,
        skipped = report.skipped,
        duplicates = report.duplicates,
        "Loaded directory CSV"
    );

    if store.is_empty() {
        warn!("No fire departments in {:?}", settings.input);
    }
    Ok(store)
}

fn progress_bar(len: u64, quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet || !io::stderr().is_terminal() {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg} (eta {eta})")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);
    info!(?settings, "Starting fire department scrape");

    let mut store = load_directory(&settings)?;

    if cli.check {
        println!("{} fire departments in {:?}", store.len(), settings.input);
        return Ok(());
    }

    let source = HttpSource::new(&settings)?;
    let ids = pipeline::id_range(&settings, store.len());
    let pb = progress_bar(ids.clone().count() as u64, cli.quiet)?;
    let stats = pipeline::build_contact_list(&mut store, &source, ids, &pb);
    pb.finish_and_clear();
    stats.log();

    match settings.output {
        Some(ref path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            output::write_csv(BufWriter::new(file), &store)?;
            info!(path = ?path, rows = store.len(), "Wrote merged CSV");
        }
        None => output::write_csv(io::stdout().lock(), &store)?,
    }

    info!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

// ── Tests ──
