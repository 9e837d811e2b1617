use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use pharmagarde::config::Config;
use pharmagarde::extractor::Strategy;
use pharmagarde::logging;
use pharmagarde::run::{self, PageSource};
use pharmagarde::storage::StorageError;
use pharmagarde::ScrapeError;

#[derive(Parser)]
#[command(name = "pharmagarde")]
#[command(about = "Scrape the weekly on-duty pharmacy listing of Togo into JSON")]
struct Cli {
    /// Page to fetch (overrides PHARMAGARDE_SOURCE_URL)
    #[arg(long)]
    url: Option<String>,

    /// Parse a saved HTML page instead of fetching
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    input: Option<PathBuf>,

    /// Directory for pharmacies.json and backup.json
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Detection strategy: auto, lines or tags
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Print the document on stdout instead of writing files
    #[arg(long)]
    stdout: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("loading configuration from environment")?;
    if let Some(url) = &cli.url {
        config = config.with_source_url(url.clone()).context("--url")?;
    }
    if let Some(dir) = &cli.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    if let Some(strategy) = cli.strategy {
        config = config.with_strategy(strategy);
    }
    Ok(config)
}

async fn execute(cli: &Cli, config: &Config) -> Result<(), ScrapeError> {
    let source = match &cli.input {
        Some(path) => PageSource::File(path.clone()),
        None => PageSource::Remote(config.source_url().to_string()),
    };

    if cli.stdout {
        let result = run::scrape(config, &source).await?;
        let json = serde_json::to_string_pretty(&result).map_err(StorageError::from)?;
        println!("{json}");
    } else {
        run::scrape_and_save(config, &source).await?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pharmagarde: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(config.log()).context("initializing logging") {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("pharmagarde: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "environment loaded from file");
    }
    info!(
        url = config.source_url(),
        output_dir = %config.output_dir().display(),
        strategy = %config.strategy(),
        "scrape started"
    );

    match execute(&cli, &config).await {
        Ok(()) => {
            info!("scrape finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match &err {
                ScrapeError::Fetch(fetch) => {
                    error!(error = %err, transient = fetch.is_transient(), "scrape failed")
                }
                err if err.is_structural() => {
                    error!(error = %err, "scrape failed, the source page layout may have changed")
                }
                err => error!(error = %err, "scrape failed"),
            }
            ExitCode::FAILURE
        }
    }
}
