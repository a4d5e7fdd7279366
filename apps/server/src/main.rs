//! Moonitor - crypto price tracker and price alerts.
//!
//! Command line front end over the alert store, favorites, market data cache
//! and alert scheduler.

mod config;
mod state;

use clap::{Parser, Subcommand};
use config::AppConfig;
use moonitor_alerts::{Cancellation, TaskOutcome};
use moonitor_core::TimeRange;
use state::{create_state, AppState};
use std::error::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

type BoxError = Box<dyn Error + Send + Sync>;

/// Moonitor CLI
#[derive(Parser, Debug)]
#[command(name = "moonitor")]
#[command(about = "Crypto price tracker with price alerts", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level: trace, debug, info, warn, error (overrides the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check alerts periodically until Ctrl+C
    Watch {
        /// Only watch this asset, at the in-app check interval
        #[arg(long)]
        asset: Option<String>,
    },
    /// Run one background check of every alert
    Check,
    /// Manage price alerts
    #[command(subcommand)]
    Alert(AlertCommand),
    /// Manage favorite assets
    #[command(subcommand)]
    Favorite(FavoriteCommand),
    /// Print the price chart of an asset
    Chart {
        asset: String,
        /// Time range: 1h, 24h, 7d, 30d, 90d
        #[arg(short, long, default_value_t = TimeRange::Day)]
        range: TimeRange,
    },
    /// Print the top markets of an asset
    Tickers { asset: String },
}

#[derive(Subcommand, Debug)]
enum AlertCommand {
    /// Set the target price of an asset
    Set { asset: String, price: String },
    /// Show the target price of an asset
    Get { asset: String },
    /// Remove the target price of an asset
    Clear { asset: String },
    /// List every active alert
    List,
}

#[derive(Subcommand, Debug)]
enum FavoriteCommand {
    Add { asset: String },
    Remove { asset: String },
    List,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Cancel `shutdown` on Ctrl+C.
fn spawn_ctrl_c_handler(shutdown: Cancellation) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });
}

async fn run_watch(state: &AppState, asset: Option<String>) {
    if !state.notifier.request_permission().await {
        warn!("Notifications not permitted, triggered alerts will not be delivered");
    }

    let shutdown = Cancellation::new();
    spawn_ctrl_c_handler(shutdown.clone());
    info!("Press Ctrl+C to stop...");

    let timing = &state.config.scheduler;
    match asset {
        Some(asset) => {
            let mut ticker = tokio::time::interval(timing.check_interval());
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let outcome = state.scheduler.check_asset(&asset, None).await;
                info!(asset = %asset, outcome = ?outcome, "Checked alert");
                if matches!(outcome, TaskOutcome::Triggered { .. } | TaskOutcome::NoAlert) {
                    break;
                }
            }
        }
        None => {
            state
                .scheduler
                .run_periodic(
                    timing.background_interval(),
                    timing.background_budget(),
                    shutdown,
                )
                .await;
        }
    }

    state.notifier.flush().await;
}

async fn run_check(state: &AppState) {
    let report = state
        .scheduler
        .run_cycle(state.config.scheduler.background_budget())
        .await;
    state.notifier.flush().await;

    println!(
        "checked {} | triggered {} | failed {} | cancelled {}",
        report.checked, report.triggered, report.failed, report.cancelled
    );
    if !report.success() {
        warn!("Alert check ran out of time");
    }
}

async fn run_alert(state: &AppState, command: AlertCommand) -> Result<(), BoxError> {
    match command {
        AlertCommand::Set { asset, price } => {
            let target = state.alerts.set_alert_from_input(&asset, &price).await?;
            println!("Alert set: {} at {}$", asset, target);
        }
        AlertCommand::Get { asset } => {
            let target = state.alerts.get_alert(&asset).await;
            if target > 0.0 {
                println!("{}: {}$", asset, target);
            } else {
                println!("{}: no alert", asset);
            }
        }
        AlertCommand::Clear { asset } => {
            state.alerts.clear_alert(&asset).await?;
            println!("Alert cleared: {}", asset);
        }
        AlertCommand::List => {
            let alerts = state.alerts.list_alerts().await?;
            if alerts.is_empty() {
                println!("No active alerts");
            }
            for alert in alerts {
                println!("{}: {}$", alert.asset_id, alert.target_price);
            }
        }
    }
    Ok(())
}

async fn run_favorite(state: &AppState, command: FavoriteCommand) -> Result<(), BoxError> {
    match command {
        FavoriteCommand::Add { asset } => {
            if state.favorites.add(&asset).await? {
                println!("Added {} to favorites", asset);
            } else {
                println!("{} is already a favorite", asset);
            }
        }
        FavoriteCommand::Remove { asset } => {
            if state.favorites.remove(&asset).await? {
                println!("Removed {} from favorites", asset);
            } else {
                println!("{} is not a favorite", asset);
            }
        }
        FavoriteCommand::List => {
            for id in state.favorites.ids().await? {
                println!("{}", id);
            }
        }
    }
    Ok(())
}

async fn run_chart(state: &AppState, asset: &str, range: TimeRange) -> Result<(), BoxError> {
    let series = state
        .market
        .chart(asset, range)
        .await
        .ok_or_else(|| format!("No chart data for {} ({})", asset, range))?;

    for point in series.points() {
        let time = chrono::DateTime::from_timestamp(point.timestamp_secs as i64, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| point.timestamp_secs.to_string());
        println!("{}  {}", time, point.price);
    }
    Ok(())
}

async fn run_tickers(state: &AppState, asset: &str) -> Result<(), BoxError> {
    let tickers = state
        .market
        .tickers(asset)
        .await
        .ok_or_else(|| format!("No market data for {}", asset))?;

    let cache = state.market.cache();
    for ticker in tickers.iter() {
        let site = cache
            .lookup_exchange_url(&ticker.exchange_name)
            .unwrap_or_default();
        println!(
            "{:<20} {:<12} {:>16} {}",
            ticker.exchange_name,
            ticker.pair(),
            ticker.last_price,
            site
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    config.apply_env();
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    init_logging(&config.log_level);
    info!(database = %config.database_url, "Moonitor starting");

    let state = create_state(config).await?;

    match args.command {
        Command::Watch { asset } => run_watch(&state, asset).await,
        Command::Check => run_check(&state).await,
        Command::Alert(command) => run_alert(&state, command).await?,
        Command::Favorite(command) => run_favorite(&state, command).await?,
        Command::Chart { asset, range } => run_chart(&state, &asset, range).await?,
        Command::Tickers { asset } => run_tickers(&state, &asset).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_chart_range() {
        let args = Args::parse_from(["moonitor", "chart", "bitcoin", "--range", "7d"]);
        match args.command {
            Command::Chart { asset, range } => {
                assert_eq!(asset, "bitcoin");
                assert_eq!(range, TimeRange::Week);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chart_default_range() {
        let args = Args::parse_from(["moonitor", "chart", "bitcoin"]);
        assert!(matches!(
            args.command,
            Command::Chart {
                range: TimeRange::Day,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_alert_set() {
        let args = Args::parse_from(["moonitor", "-l", "debug", "alert", "set", "bitcoin", "65000,5"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        match args.command {
            Command::Alert(AlertCommand::Set { asset, price }) => {
                assert_eq!(asset, "bitcoin");
                assert_eq!(price, "65000,5");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
