//! auction-watch: monitors Yahoo! Auctions listings and compares Amazon offers.
//!
//! Commands:
//! - `auction-watch run [--start]` - run the interval scheduler until Ctrl-C
//! - `auction-watch check` - run one monitoring cycle now
//! - `auction-watch search|detail|history|estimate` - one-off Yahoo lookups
//! - `auction-watch amazon-product|amazon-offers` - one-off Amazon lookups
//! - `auction-watch track|untrack` - manage the monitoring worklist
//! - `auction-watch notifications` - show recent change events

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use auction_watch::browser::{ChromeSessionProvider, FetchPolicy, SessionProvider};
use auction_watch::extract::DEFAULT_HISTORY_COUNT;
use auction_watch::gateway::{AmazonGateway, DetailSource, FetchOutcome, YahooGateway};
use auction_watch::monitor::MonitoringCycle;
use auction_watch::pricing::estimate_from_history;
use auction_watch::scheduler::CycleScheduler;
use auction_watch::store::SqliteStore;
use auction_watch::utils::logging::init_tracing;
use auction_watch::AppConfig;

/// Auction price monitoring pipeline
#[derive(Parser)]
#[command(name = "auction-watch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve until Ctrl-C; the interval scheduler starts when
    /// `scheduler.auto_start` is set or `--start` is given
    Run {
        #[arg(long)]
        start: bool,
    },

    /// Run one monitoring cycle immediately
    Check,

    /// Search open auctions by keyword
    Search { keyword: String },

    /// Fetch one auction's detail page
    Detail { auction_id: String },

    /// List closed auctions with their winning prices
    History {
        keyword: String,
        #[arg(long, default_value_t = DEFAULT_HISTORY_COUNT)]
        count: u32,
    },

    /// Estimate a winning price from closed auctions
    Estimate {
        keyword: String,
        #[arg(long)]
        buy_now: Option<i64>,
    },

    /// Fetch an Amazon product page by ASIN
    AmazonProduct { asin: String },

    /// Fetch the competing offers for an ASIN
    AmazonOffers { asin: String },

    /// Start monitoring an auction
    Track {
        auction_id: String,
        #[arg(long, default_value_t = 0)]
        product: i64,
    },

    /// Stop monitoring an auction (the link is kept, switched off)
    Untrack {
        auction_id: String,
        #[arg(long, default_value_t = 0)]
        product: i64,
    },

    /// Show recent change events
    Notifications {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

struct App {
    config: AppConfig,
    yahoo: Arc<YahooGateway>,
    amazon: AmazonGateway,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let sessions: Arc<dyn SessionProvider> = Arc::new(ChromeSessionProvider::new(config.browser.clone()));
        let yahoo = Arc::new(YahooGateway::new(
            sessions.clone(),
            FetchPolicy::new(&config.yahoo, &config.fetch),
        ));
        let amazon = AmazonGateway::new(sessions, FetchPolicy::new(&config.amazon, &config.fetch));

        Self { config, yahoo, amazon }
    }

    async fn store(&self) -> Result<SqliteStore> {
        Ok(SqliteStore::connect(&self.config.database, self.config.notifications.max_stored).await?)
    }

    async fn scheduler(&self) -> Result<CycleScheduler> {
        let store = Arc::new(self.store().await?);
        let cycle = Arc::new(MonitoringCycle::new(store, self.yahoo.clone()));
        Ok(CycleScheduler::new(cycle, self.config.scheduler.interval()))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn require_found<T>(outcome: FetchOutcome<T>, what: &str) -> Result<T> {
    match outcome {
        FetchOutcome::Found(record) => Ok(record),
        FetchOutcome::NotFound => bail!("{} not found (missing page or bot challenge)", what),
        FetchOutcome::TransientFailure => bail!("{} could not be fetched, try again later", what),
    }
}

/// The interval trigger runs only when asked for, by flag or by config.
fn scheduler_enabled(start_flag: bool, config: &AppConfig) -> bool {
    start_flag || config.scheduler.auto_start
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let _log_guard = init_tracing(&config.logging)?;
    let app = App::new(config);

    match cli.command {
        Commands::Run { start } => {
            let scheduler = app.scheduler().await?;
            if scheduler_enabled(start, &app.config) {
                scheduler.start().await?;
            } else {
                info!("Scheduler auto-start is disabled; pass --start to enable interval checks");
            }

            info!("Waiting for Ctrl-C");
            tokio::signal::ctrl_c().await?;
            info!("Shutting down...");
            scheduler.stop().await?;
        }
        Commands::Check => {
            let scheduler = app.scheduler().await?;
            match scheduler.run_now().await? {
                Some(report) => print_json(&report)?,
                None => bail!("a monitoring cycle is already running"),
            }
        }
        Commands::Search { keyword } => {
            let results = require_found(app.yahoo.search(&keyword).await?, "search results")?;
            print_json(&results)?;
        }
        Commands::Detail { auction_id } => {
            let detail = require_found(app.yahoo.auction_detail(&auction_id).await?, "auction")?;
            print_json(&detail)?;
        }
        Commands::History { keyword, count } => {
            let history = require_found(app.yahoo.closed_history(&keyword, count).await?, "history")?;
            print_json(&history)?;
        }
        Commands::Estimate { keyword, buy_now } => {
            let outcome = app.yahoo.closed_history(&keyword, DEFAULT_HISTORY_COUNT).await?;
            let (samples, estimated_price) = require_found(
                outcome.map(|history| (history.len(), estimate_from_history(&history, buy_now))),
                "history",
            )?;
            print_json(&serde_json::json!({
                "keyword": keyword,
                "samples": samples,
                "estimated_price": estimated_price,
            }))?;
        }
        Commands::AmazonProduct { asin } => {
            let product = require_found(app.amazon.product(&asin).await?, "product")?;
            print_json(&product)?;
        }
        Commands::AmazonOffers { asin } => {
            let offers = require_found(app.amazon.competitor_offers(&asin).await?, "offers")?;
            print_json(&offers)?;
        }
        Commands::Track { auction_id, product } => {
            let detail = require_found(app.yahoo.auction_detail(&auction_id).await?, "auction")?;
            let store = app.store().await?;
            let row_id = store.upsert_auction(&detail).await?;
            store.track(product, row_id).await?;
            print_json(&store.find_auction(&auction_id).await?)?;
        }
        Commands::Untrack { auction_id, product } => {
            app.store().await?.untrack(product, &auction_id).await?;
            println!("Stopped monitoring {} for product {}", auction_id, product);
        }
        Commands::Notifications { limit } => {
            print_json(&app.store().await?.list_notifications(limit).await?)?;
        }
    }

    Ok(())
}
