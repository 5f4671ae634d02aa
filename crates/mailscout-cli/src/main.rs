use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use mailscout_client::{GooglePlacesClient, StrategyFetcher};
use mailscout_core::config::{FetchStrategy, PipelineConfig};
use mailscout_core::locations::load_locations;
use mailscout_core::models::LocationQuery;
use mailscout_core::pipeline::EmailPipeline;
use mailscout_core::report::TracingPipelineReporter;
use mailscout_core::traits::AddressBook;
use mailscout_db::{Database, DatabaseConfig};

const DEFAULT_LOG_DIRECTIVES: &str =
    "mailscout_core=info,mailscout_client=info,mailscout_db=info,mailscout=info";

#[derive(Parser)]
#[command(
    name = "mailscout",
    version,
    about = "Find contact emails of local businesses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search businesses, scan their websites and store the emails found
    Search {
        /// CSV file with `City` and `State` columns; one search per row
        locations: Option<PathBuf>,

        /// Businesses to search (prompted for when omitted)
        #[arg(short, long)]
        query: Option<String>,

        /// Google Places API key
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
        api_key: String,

        /// How pages are fetched: "http" or "browser"
        #[arg(long, env = "MAILSCOUT_FETCH_STRATEGY", default_value_t = FetchStrategy::Http)]
        fetch_strategy: FetchStrategy,

        /// Per-page time budget in seconds (10 for http, 5 for browser by default)
        #[arg(long, env = "MAILSCOUT_FETCH_BUDGET_SECS")]
        budget_secs: Option<u64>,

        /// Maximum page fetches in flight
        #[arg(long, env = "MAILSCOUT_FETCH_CONCURRENCY", default_value_t = 1)]
        concurrency: usize,

        /// SQLite database file
        #[arg(long, env = "MAILSCOUT_DB_PATH")]
        db: Option<PathBuf>,

        /// Chrome/Chromium binary for the browser strategy
        #[cfg(feature = "browser")]
        #[arg(long, env = "CHROME_BIN")]
        chrome_bin: Option<PathBuf>,
    },

    /// Parse a location file and print the rows that would be searched
    Locations {
        /// CSV file with `City` and `State` columns
        file: PathBuf,
    },

    /// List stored emails, newest first
    Emails {
        /// Number of rows to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// SQLite database file
        #[arg(long, env = "MAILSCOUT_DB_PATH")]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            locations,
            query,
            api_key,
            fetch_strategy,
            budget_secs,
            concurrency,
            db,
            #[cfg(feature = "browser")]
            chrome_bin,
        } => {
            let query = match query.filter(|q| !q.trim().is_empty()) {
                Some(q) => q.trim().to_string(),
                None => match prompt_query().await {
                    Some(q) => q,
                    None => {
                        tracing::info!("Search cancelled");
                        return Ok(());
                    }
                },
            };

            let locations = match locations {
                Some(path) => read_location_file(&path)?,
                None => Vec::new(),
            };

            let mut config = PipelineConfig::new(api_key, query)
                .with_fetch_strategy(fetch_strategy)
                .with_fetch_concurrency(concurrency);
            if let Some(secs) = budget_secs {
                ensure!(secs > 0, "--budget-secs must be at least 1");
                config = config.with_fetch_budget(Duration::from_secs(secs));
            }

            #[cfg(feature = "browser")]
            let fetcher = match (fetch_strategy, chrome_bin) {
                (FetchStrategy::Browser, Some(bin)) => StrategyFetcher::browser_with_executable(bin),
                _ => StrategyFetcher::from_strategy(fetch_strategy)
                    .context("Failed to set up page fetcher")?,
            };
            #[cfg(not(feature = "browser"))]
            let fetcher = StrategyFetcher::from_strategy(fetch_strategy)
                .context("Failed to set up page fetcher")?;

            cmd_search(config, &locations, fetcher, database_config(db)).await?;
        }
        Commands::Locations { file } => {
            let rows = read_location_file(&file)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
            tracing::info!(rows = rows.len(), "Location file is valid");
        }
        Commands::Emails { limit, db } => {
            cmd_emails(limit, database_config(db)).await?;
        }
    }

    Ok(())
}

fn database_config(path: Option<PathBuf>) -> DatabaseConfig {
    path.map(DatabaseConfig::new)
        .unwrap_or_else(DatabaseConfig::from_env)
}

fn read_location_file(path: &Path) -> Result<Vec<LocationQuery>> {
    load_locations(path)
        .with_context(|| format!("Failed to load location file: {}", path.display()))
}

/// Asks for the business query. `None` when the user enters nothing or the
/// prompt cannot be shown (no terminal, EOF, interrupt).
async fn prompt_query() -> Option<String> {
    let answer = tokio::task::spawn_blocking(|| {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Businesses to search")
            .allow_empty(true)
            .interact_text()
    })
    .await;

    match answer {
        Ok(Ok(q)) if !q.trim().is_empty() => Some(q.trim().to_string()),
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Prompt failed");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "Prompt task failed");
            None
        }
    }
}

async fn cmd_search(
    config: PipelineConfig,
    locations: &[LocationQuery],
    fetcher: StrategyFetcher,
    db_config: DatabaseConfig,
) -> Result<()> {
    let search = GooglePlacesClient::new(&config.api_key)
        .context("Failed to set up Places client")?;
    let db = Database::new(db_config);

    tracing::info!(
        query = %config.query,
        locations = locations.len(),
        strategy = %config.fetch_strategy,
        budget = ?config.fetch_budget,
        concurrency = config.fetch_concurrency,
        db = %db.path().display(),
        "Starting search"
    );

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing current step");
                cancel.cancel();
            }
        })
    };

    let pipeline = EmailPipeline::new(search, fetcher, db, config);
    let summary = pipeline
        .run(locations, &TracingPipelineReporter, &cancel)
        .await;
    ctrl_c.abort();

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn cmd_emails(limit: usize, db_config: DatabaseConfig) -> Result<()> {
    let db = Database::new(db_config);
    let book = db
        .connect()
        .await
        .with_context(|| format!("Failed to open database: {}", db.path().display()))?;
    book.ensure_schema().await?;

    let rows = book.list(limit).await?;
    let total = book.count().await?;
    book.close().await?;

    if rows.is_empty() {
        println!("No emails stored in {}", db.path().display());
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&rows)?);
    tracing::info!(shown = rows.len(), total, "Listed stored emails");

    Ok(())
}
