mod echo;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use metagen_core::{BatchRunner, DeepSeekGenerator, MySqlContentStore, Settings, parse_delay, parse_limit};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fill content metakey/metadesc fields with generated SEO metadata
#[derive(Parser, Debug)]
#[command(name = "metagen")]
#[command(version)]
#[command(about = "Generate SEO keywords and descriptions for Joomla articles", long_about = None)]
struct Args {
    /// Maximum number of records to process ("all" for no limit); overrides RECORDS_LIMIT
    #[arg(short = 'n', long, value_name = "N")]
    limit: Option<String>,

    /// Seconds to wait between records; overrides API_DELAY
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Configuration file (default: ./metagen.toml, then the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "metagen_core=debug,metagen=debug" } else { "warn" }
}

fn init_tracing(verbose: bool) {
    let default = default_filter(verbose);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(limit) = args.limit.as_deref() {
        settings.batch.limit = parse_limit(Some(limit)).context("Invalid --limit")?;
    }
    if let Some(delay) = args.delay {
        settings.batch.delay = parse_delay(delay).context("Invalid --delay")?;
    }

    tracing::debug!(?settings, "configuration loaded");
    Ok(settings)
}

async fn run(settings: &Settings, store: &mut MySqlContentStore) -> anyhow::Result<()> {
    let generator = DeepSeekGenerator::new(settings.generator.clone())?;
    let runner =
        BatchRunner::new(Box::new(generator), settings.batch.clone()).with_observer(Box::new(echo::ConsoleObserver));

    let report = runner.run(store).await.context("Failed to read content records")?;
    if report.total > 0 {
        echo::print_summary(&report);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Variables already in the process environment take precedence over `.env`.
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let settings = load_settings(&args)?;
    echo::print_banner(settings.batch.limit);

    let mut store = MySqlContentStore::connect(&settings.database)
        .await
        .context("Failed to connect to the content database")?;

    let result = run(&settings, &mut store).await;

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "closing the database connection failed");
    }
    echo::print_info("Finished");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "warn");
        assert!(default_filter(true).contains("metagen_core=debug"));
    }
}
