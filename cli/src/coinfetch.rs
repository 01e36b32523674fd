use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use lib_marketdata::configs::load_market_config;
use lib_marketdata::loggers::{init_tracing, LogSettings};
use lib_marketdata::{AssetHistory, AssetListing, HistoryWindow, MarketDataClient, MarketDataError};

/// Fetch crypto asset listings and price history from a CoinGecko-style API.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Fetches a page of assets ranked by market capitalization, or the price, market cap and volume history of one asset. Settings come from marketdata*.json files in the config directory, MARKETDATA_* environment variables (a .env file is honoured) and finally the flags below."
)]
struct Args {
    /// Directory holding marketdata.json and its mode/platform variants.
    #[arg(long, env = "CONFIGS_LOCATION", default_value = ".")]
    config_dir: PathBuf,

    /// Running mode, selects marketdata.{mode}.json.
    #[arg(long, env = "RUNNING_MODE_COINFETCH")]
    mode: Option<String>,

    /// Provider root URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Quote currency code, e.g. usd or eur.
    #[arg(long)]
    currency: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retries for transient failures (transport errors, 429, 5xx).
    #[arg(long)]
    max_retries: Option<u32>,

    /// Print raw JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Also write JSON logs to daily files in this directory.
    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assets ranked by market capitalization.
    Listings {
        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Assets per page (1-250).
        #[arg(long, default_value_t = 50)]
        per_page: u32,
    },
    /// Price, market cap and volume series for one asset.
    History {
        /// Provider asset id, e.g. bitcoin.
        asset_id: String,

        /// Window in days, or `max`.
        #[arg(long, default_value = "30")]
        days: HistoryWindow,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // load .env before clap reads env-backed flags
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut settings = LogSettings::new("coinfetch");
    if let Some(dir) = &args.log_dir {
        settings = settings.with_log_dir(dir);
    }
    let _guard = init_tracing(&settings).context("failed to initialize logging")?;

    let mut config = load_market_config(&args.config_dir, args.mode.as_deref())
        .context("failed to load market data configuration")?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(currency) = &args.currency {
        config.quote_currency = currency.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.http.timeout = Duration::from_secs(secs);
    }
    if let Some(retries) = args.max_retries {
        config.http.max_retries = retries;
    }
    info!(base_url = %config.base_url, currency = %config.quote_currency, "market data client configured");

    let client = MarketDataClient::new(config).context("failed to build market data client")?;

    let outcome = match &args.command {
        Command::Listings { page, per_page } => {
            run_listings(&client, *page, *per_page, args.json).await
        }
        Command::History { asset_id, days } => run_history(&client, asset_id, *days, args.json).await,
    };

    if let Err(e) = &outcome {
        if let Some(md) = e.downcast_ref::<MarketDataError>() {
            error!(kind = md.kind(), status = ?md.status(), retryable = md.is_retryable(), "{}", md);
        }
    }
    outcome
}

async fn run_listings(client: &MarketDataClient, page: u32, per_page: u32, json: bool) -> Result<()> {
    let listings = client.fetch_default_listings(page, per_page).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    print_listings(&listings, client.quote_currency());
    if listings.len() < per_page as usize {
        println!("(end of listings: {} of {} requested)", listings.len(), per_page);
    }
    Ok(())
}

fn print_listings(listings: &[AssetListing], currency: &str) {
    println!(
        "{:>5}  {:<24} {:<8} {:>18} {:>22} {:>9}",
        "RANK",
        "NAME",
        "SYMBOL",
        format!("PRICE ({})", currency.to_uppercase()),
        "MARKET CAP",
        "24H %"
    );
    for asset in listings {
        let change = asset
            .price_change_percentage_24h
            .map(|p| format!("{:+.2}", p))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<24} {:<8} {:>18.6} {:>22.0} {:>9}",
            asset.market_cap_rank,
            truncate(&asset.name, 24),
            asset.symbol.to_uppercase(),
            asset.current_price,
            asset.market_cap,
            change
        );
    }
}

async fn run_history(client: &MarketDataClient, asset_id: &str, days: HistoryWindow, json: bool) -> Result<()> {
    let history = client.fetch_default_history(asset_id, days).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    print_history(&history, asset_id, client.quote_currency(), days);
    Ok(())
}

fn print_history(history: &AssetHistory, asset_id: &str, currency: &str, days: HistoryWindow) {
    let window = match days {
        HistoryWindow::Days(1) => "1 day".to_string(),
        HistoryWindow::Days(n) => format!("{} days", n),
        HistoryWindow::Max => "full history".to_string(),
    };
    println!("asset:   {} ({}), {}", asset_id, currency, window);
    println!(
        "points:  prices={} market_caps={} total_volumes={} aligned={}",
        history.prices.len(),
        history.market_caps.len(),
        history.total_volumes.len(),
        if history.is_aligned() { "yes" } else { "no" }
    );
    if let Some((first, last)) = history.time_span() {
        println!(
            "span:    {} .. {}",
            first.to_rfc3339_opts(SecondsFormat::Secs, true),
            last.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    match history.latest_price() {
        Some(point) => println!("latest:  {:.6} {}", point.value, currency.to_uppercase()),
        None => println!("latest:  no price samples in window"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}
