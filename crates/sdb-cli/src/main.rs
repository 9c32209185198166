//! sdb: static data bundle tool
//!
//! Usage:
//!   sdb [--config sdb.toml] inspect BUNDLE
//!   sdb [--config sdb.toml] extract BUNDLE ENTRY [--output PATH]
//!   sdb [--config sdb.toml] load BUNDLE [--json]
//!
//! Salts, iteration count and key overrides come from the `[bundle]` section
//! of the config file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sdb_bundle::source::{self, FileSource};
use sdb_bundle::{BundleDecoder, DecodedBundle};
use sdb_core::SdbConfig;
use sdb_crypto::BundleKeys;
use sdb_tables::{RecordStore, StaticData, TableSummary};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sdb", version, about = "Decode and inspect static data bundles")]
struct Cli {
    /// Path to sdb.toml configuration file
    #[arg(long, short = 'c', env = "SDB_CONFIG", default_value = "sdb.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log].level
    #[arg(long, env = "SDB_LOG")]
    log: Option<String>,

    /// Log format; overrides [log].format
    #[arg(long, env = "SDB_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show bundle identity and the inner archive's entries
    Inspect {
        /// Bundle path
        bundle: String,
    },

    /// Write one decoded inner entry to a file or stdout
    Extract {
        /// Bundle path
        bundle: String,

        /// Inner archive entry name, e.g. CharacterTable.json
        entry: String,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Run the full initialization and report per-table record counts
    Load {
        /// Bundle path
        bundle: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Read quietly: no subscriber exists until [log] has been applied.
    let loaded = SdbConfig::read(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    let (level, format) = log_settings(&cli, &config);
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "sdb starting"
    );
    if !config_found {
        warn!("config file not found: {}  (using defaults)", cli.config.display());
    }

    match cli.command {
        Commands::Inspect { bundle } => cmd_inspect(&config, bundle).await,
        Commands::Extract {
            bundle,
            entry,
            output,
        } => cmd_extract(&config, bundle, &entry, output).await,
        Commands::Load { bundle, json } => cmd_load(config, bundle, json).await,
    }
}

// ── inspect ──

async fn cmd_inspect(config: &SdbConfig, bundle: String) -> Result<()> {
    let decoded = decode(config, bundle).await?;
    let identity = decoded.identity();

    println!("sha256:  {}", identity.sha256_hex());
    println!("size:    {} bytes", identity.size);
    println!("entries: {}", decoded.entries().len());
    for name in decoded.entries() {
        println!("  {name}");
    }
    Ok(())
}

// ── extract ──

async fn cmd_extract(
    config: &SdbConfig,
    bundle: String,
    entry: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let decoded = decode(config, bundle).await?;
    let content = decoded
        .read(entry)
        .with_context(|| format!("reading entry {entry}"))?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &content)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{entry} -> {} ({} bytes)", path.display(), content.len());
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&content)
                .context("writing to stdout")?;
        }
    }
    Ok(())
}

// ── load ──

#[derive(Serialize)]
struct LoadReport {
    sha256: String,
    size: u64,
    tables: Vec<TableSummary>,
    indices: Vec<IndexReport>,
}

#[derive(Serialize)]
struct IndexReport {
    name: &'static str,
    keys: usize,
    ignored: usize,
}

impl LoadReport {
    fn new(store: &RecordStore) -> Self {
        let identity = store.identity();
        Self {
            sha256: identity.sha256_hex(),
            size: identity.size,
            tables: store.summaries(),
            indices: store
                .indices()
                .into_iter()
                .map(|index| IndexReport {
                    name: index.name(),
                    keys: index.len(),
                    ignored: index.ignored(),
                })
                .collect(),
        }
    }
}

async fn cmd_load(mut config: SdbConfig, bundle: String, json: bool) -> Result<()> {
    config.bundle.location = bundle;

    let data = StaticData::from_config(FileSource::new(), &config)?;
    let store = data
        .get()
        .await
        .with_context(|| format!("loading {}", config.bundle.location))?;
    let report = LoadReport::new(&store);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("sha256: {}", report.sha256);
    println!("size:   {} bytes", report.size);
    println!();
    println!("{:<32} {:>10}", "TABLE", "RECORDS");
    for table in &report.tables {
        println!("{:<32} {:>10}", table.table, table.records);
    }
    println!();
    for index in &report.indices {
        println!(
            "index {}: {} keys ({} duplicates ignored)",
            index.name, index.keys, index.ignored
        );
    }
    Ok(())
}

// ── helpers ──

async fn decode(config: &SdbConfig, location: String) -> Result<DecodedBundle> {
    let keys = BundleKeys::from_config(&config.bundle)?;

    let raw = source::load(&FileSource::new(), &location)
        .await
        .with_context(|| format!("fetching {location}"))?;
    let decoded = tokio::task::spawn_blocking(move || BundleDecoder::new(keys)?.decode(&raw))
        .await
        .context("decode task failed")??;
    Ok(decoded)
}

/// Command-line values win over the config's `[log]` section.
fn log_settings(cli: &Cli, config: &SdbConfig) -> (String, LogFormat) {
    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match &cli.log_format {
        Some(format) => format.clone(),
        None if config.log.format.eq_ignore_ascii_case("json") => LogFormat::Json,
        None => LogFormat::Text,
    };
    (level, format)
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
