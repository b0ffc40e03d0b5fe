use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ratekey::config::{KeyConfig, LoggingConfig};
use ratekey::ratelimit::{derive_batch, parse_batch, RequestParts};

/// Derive rate limit bucket keys from request credentials.
#[derive(Debug, Parser)]
#[command(name = "ratekey", version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Derive the bucket key for a single request
    Derive {
        /// Limit category, e.g. "comments"
        #[arg(short = 'k', long)]
        category: String,

        /// Raw Authorization header value
        #[arg(short, long)]
        authorization: Option<String>,

        /// Client network address
        #[arg(short = 'n', long)]
        address: Option<String>,
    },

    /// Derive keys for every request in a YAML or JSON file
    Batch {
        /// File containing a list of requests
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => KeyConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => KeyConfig::default(),
    };

    init_tracing(&config.logging);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &cli.config {
        log_config_loaded(path, &config);
    }

    match cli.command {
        Command::Derive {
            category,
            authorization,
            address,
        } => {
            let category = config.resolve_category(&category)?;
            let request = RequestParts {
                authorization,
                network_address: address,
                ..RequestParts::default()
            };

            let key = category.derive(&request);
            debug!(category = %category, source = %key.source(), "Derived bucket key");
            println!("{}", key);
        }
        Command::Batch { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let requests = parse_batch(&contents)?;
            info!(count = requests.len(), "Processing request batch");

            for key in derive_batch(&config, &requests)? {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

/// Report the loaded config. Called once tracing is up, since the config
/// carries the log settings.
fn log_config_loaded(path: &Path, config: &KeyConfig) {
    info!(
        path = %path.display(),
        categories = config.categories.len(),
        "Configuration loaded"
    );
}

/// Initialize tracing on stderr so stdout carries only keys.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
