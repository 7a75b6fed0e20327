//! ixgeo - attribute Internet Exchange participants to countries.
//!
//! This is the command-line interface for the ixgeo library.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ixgeo::asn::AttributionResolver;
use ixgeo::config::{CaptureFormat, VariantKind};
use ixgeo::report::{attribution_line, ReportWriter};
use ixgeo::{pipeline, Config, ExchangeConfig, SortOrder};
use std::path::PathBuf;

/// Get the version string for ixgeo
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version = get_version(), about = "Attribute Internet Exchange participants to countries", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (debug logging)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse one capture and print its distinct origin ASNs
    Parse {
        /// Capture file
        capture: PathBuf,

        /// Peering LAN prefix of the exchange (repeatable)
        #[clap(short, long = "prefix")]
        prefixes: Vec<String>,

        /// Origin attribute to extract
        #[clap(long, value_enum, default_value = "origin")]
        variant: VariantArg,

        /// Column where the Path field starts
        #[clap(long, default_value_t = ixgeo::bgp::parser::DEFAULT_PATH_COLUMN)]
        path_column: usize,

        /// Capture layout
        #[clap(long, value_enum, default_value = "table")]
        format: FormatArg,

        /// Print distinct networks instead of ASNs
        #[clap(long)]
        networks: bool,
    },

    /// Resolve ASNs to countries and print attribution lines
    Resolve {
        /// ASNs (`64500` or `AS64500`)
        #[clap(required = true)]
        asns: Vec<String>,

        /// Use local data sets only
        #[clap(long)]
        offline: bool,

        /// Concurrent resolutions
        #[clap(short, long)]
        workers: Option<usize>,
    },

    /// Run the full pipeline for every configured exchange
    Report {
        /// Print the report as JSON on stdout
        #[clap(long)]
        json: bool,

        /// Sort summaries by ascending count
        #[clap(long)]
        ascending: bool,

        /// Output directory (overrides the configuration)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Use local data sets only
        #[clap(long)]
        offline: bool,

        /// Concurrent resolutions
        #[clap(short, long)]
        workers: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum VariantArg {
    Origin,
    Connected,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Table,
    Alice,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main(args)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays clean for results
fn init_logging(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose > 0 { "ixgeo=debug" } else { "ixgeo=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn async_main(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => Config::default(),
    };

    match args.command {
        Command::Parse {
            capture,
            prefixes,
            variant,
            path_column,
            format,
            networks,
        } => cmd_parse(capture, prefixes, variant, path_column, format, networks),
        Command::Resolve {
            asns,
            offline,
            workers,
        } => cmd_resolve(config, &asns, offline, workers).await,
        Command::Report {
            json,
            ascending,
            output,
            offline,
            workers,
        } => {
            if args.config.is_none() {
                bail!("report needs a configuration file (--config)");
            }
            cmd_report(config, json, ascending, output, offline, workers).await
        }
    }
}

fn cmd_parse(
    capture: PathBuf,
    prefixes: Vec<String>,
    variant: VariantArg,
    path_column: usize,
    format: FormatArg,
    networks: bool,
) -> Result<()> {
    let mut exchange = ExchangeConfig::new("capture", capture);
    exchange.reference_prefixes = prefixes;
    exchange.path_column = path_column;
    exchange.variant = match variant {
        VariantArg::Origin => VariantKind::Origin,
        VariantArg::Connected => VariantKind::Connected,
    };
    exchange.format = match format {
        FormatArg::Table => CaptureFormat::Table,
        FormatArg::Alice => CaptureFormat::Alice,
    };

    let ingested = pipeline::ingest(&exchange)
        .with_context(|| format!("parsing {}", exchange.capture.display()))?;
    let lines = if networks {
        &ingested.reduced.networks
    } else {
        &ingested.reduced.asns
    };
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, offline: bool, workers: Option<usize>) {
    if offline {
        config.resolver.live = false;
    }
    if let Some(workers) = workers {
        config.resolver.workers = workers;
    }
}

async fn cmd_resolve(
    mut config: Config,
    asns: &[String],
    offline: bool,
    workers: Option<usize>,
) -> Result<()> {
    apply_overrides(&mut config, offline, workers);
    let resolver: AttributionResolver = pipeline::build_resolver(&config).await?;

    for result in resolver.resolve_batch(asns).await {
        println!("{}", attribution_line(&result));
    }
    Ok(())
}

async fn cmd_report(
    mut config: Config,
    json: bool,
    ascending: bool,
    output: Option<PathBuf>,
    offline: bool,
    workers: Option<usize>,
) -> Result<()> {
    apply_overrides(&mut config, offline, workers);
    if let Some(output) = output {
        config.output.dir = output;
    }
    config.validate()?;

    let order = if ascending {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    };
    let report = pipeline::run(&config, order).await?;

    let writer = ReportWriter::new(&config.output.dir)?;
    writer.write(&report)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        eprintln!(
            "{} exchanges, {} ASNs, {} unresolved; report written to {}",
            report.exchanges.len(),
            report.attributions.len(),
            report.summary.missing.len(),
            writer.dir().display()
        );
    }
    Ok(())
}
