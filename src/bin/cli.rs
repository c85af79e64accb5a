//! Clarity results CLI
//!
//! Streams election results from a Clarity reporting site to stdout.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clarity_results::{
    error::Result,
    models::{Config, Level, OutputFormat, infer_levels},
    pipeline::{self, Ingestor},
    storage::ArchiveCache,
};

/// Clarity - Election Night Results Scraper
#[derive(Parser, Debug)]
#[command(
    name = "clarity",
    version,
    about = "Fetch and decode Clarity election results"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "clarity.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream results for a results page as CSV
    Results {
        /// Results summary page URL
        url: String,

        /// Include every subjurisdiction below the page
        #[arg(long)]
        expand: bool,

        /// Directory for cached report archives
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Ignore cached archives and download again
        #[arg(long)]
        refresh: bool,

        /// Write JSON lines instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// List the jurisdictions below a results page
    Jurisdictions {
        /// Results summary page URL
        url: String,

        /// Level of the page (defaults to the deepest level in the URL)
        #[arg(long)]
        level: Option<Level>,

        /// Write JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Print the levels a results URL names
    Levels {
        /// Results summary page URL
        url: String,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Results {
            url,
            expand,
            cache_dir,
            refresh,
            json,
        } => {
            if cache_dir.is_some() {
                config.cache.dir = cache_dir;
            }
            config.cache.refresh |= refresh;
            if json {
                config.output.format = OutputFormat::Json;
            }
            config.validate()?;

            if let Some(cache) = ArchiveCache::from_config(&config.cache) {
                log::info!("Caching archives in {}", cache.dir().display());
            }

            let ingestor = Ingestor::from_config(&config)?;
            let stream = ingestor.stream_results(&url, expand).await?;
            log::info!(
                "Fetching results for {} jurisdiction(s)",
                stream.tree().len()
            );

            let stdout = io::stdout();
            pipeline::run_results(stream, expand, &config.output, stdout.lock()).await?;
        }

        Command::Jurisdictions { url, level, json } => {
            config.validate()?;

            let ingestor = Ingestor::from_config(&config)?;
            let tree = ingestor.discover_jurisdictions(&url, level).await?;

            let format = if json {
                OutputFormat::Json
            } else {
                config.output.format
            };
            pipeline::run_jurisdictions(&tree, format, io::stdout().lock())?;
        }

        Command::Levels { url } => {
            let levels = infer_levels(&url)?;
            println!("{}", serde_json::to_string_pretty(&levels)?);
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }
    }

    Ok(())
}
