//! ccp - copy S3 objects into Azure Blob Storage.
//!
//! Reads a tab-separated manifest of `(bucket, percent-encoded key)` pairs
//! and copies each object into the destination storage account, mapping
//! bucket names onto Azure container naming rules. Credentials come from the
//! ambient AWS and Azure credential chains.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crosscopy::{AccessTier, Copier, PipelineOptions, UploadOptions};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;

mod backends;

/// ccp - bulk copy from S3 to Azure Blob Storage
///
/// Each input line names one object to copy: source bucket and
/// percent-encoded key, separated by a tab. Transfers run concurrently;
/// individual failures are logged and counted without stopping the run.
#[derive(Parser, Debug)]
#[command(name = "ccp", version, about, long_about = None)]
struct Args {
    /// Input file to read. Use - for stdin.
    #[arg(short = 'i', long, default_value = "-")]
    input: String,

    /// Destination endpoint, e.g. https://<storage-account-name>.blob.core.windows.net/
    #[arg(long)]
    azure_url: String,

    /// Destination access tier
    #[arg(long, value_enum, ignore_case = true, default_value = "hot")]
    azure_tier: TierArg,

    /// Number of concurrent transfers
    #[arg(short = 'j', long = "jobs", default_value_t = 1)]
    jobs: usize,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TierArg {
    Hot,
    Cool,
    Archive,
}

impl From<TierArg> for AccessTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Hot => AccessTier::Hot,
            TierArg::Cool => AccessTier::Cool,
            TierArg::Archive => AccessTier::Archive,
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if let Err(err) = run_copy(&args) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run_copy(args: &Args) -> Result<()> {
    // Opened before the storage clients so a bad path fails without touching
    // any credential chain.
    let input = open_input(&args.input)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let s3 = backends::S3Reader::connect(&runtime)?;
    let azure = backends::AzureWriter::connect(runtime.handle().clone(), &args.azure_url)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let copier = Copier::new(
        Arc::new(s3),
        Arc::new(azure),
        UploadOptions {
            tier: args.azure_tier.into(),
        },
    );
    let options = PipelineOptions::default()
        .with_workers(args.jobs)
        .cancel_token(cancel);

    let report = crosscopy::run(input, &copier, &options)?;
    println!(
        "Processed {} items ({} errors)",
        report.items_seen,
        report.items_failed()
    );
    Ok(())
}

fn open_input(path: &str) -> Result<Box<dyn BufRead + Send>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file =
            File::open(path).with_context(|| format!("could not open input file {path}"))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
