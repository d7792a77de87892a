//! Trading Signal Router
//!
//! Receives buy/sell signals, routes them to a forex or crypto brokerage,
//! attaches stop-loss / take-profit brackets and reports account state.

mod activity;
mod api;
mod config;
mod desk;
mod error;
mod exchange;
mod models;
mod trading;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::RouterConfig;
use crate::desk::SignalDesk;
use crate::models::{TradeAction, TradeIntentPayload};
use crate::trading::{forex_market_status, PipModel, RiskCalculator};

/// Trading signal router CLI.
#[derive(Parser)]
#[command(name = "sigroute")]
#[command(about = "Route trading signals to forex and crypto brokerages", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single trade signal
    Trade {
        /// Instrument, e.g. EUR_USD or BTCUSDT
        symbol: String,

        /// buy or sell
        action: String,

        /// Order size in venue units
        units: Decimal,

        /// Stop-loss distance in pips
        #[arg(long)]
        sl_pips: Option<Decimal>,

        /// Take-profit distance in pips
        #[arg(long)]
        tp_pips: Option<Decimal>,
    },

    /// Show account status across exchanges
    Status,

    /// Show which exchange a symbol routes to
    Classify {
        symbol: String,
    },

    /// Compute bracket levels without trading
    Bracket {
        /// Reference (fill) price
        price: Decimal,

        /// buy or sell
        action: String,

        #[arg(long)]
        sl_pips: Decimal,

        #[arg(long)]
        tp_pips: Decimal,

        /// Pip model: percentage or tick:<size> (defaults to PIP_MODEL)
        #[arg(long)]
        pip_model: Option<String>,
    },

    /// Show forex market hours and active sessions
    Market,

    /// Feed a JSON-lines file of signals through the desk
    Replay {
        file: PathBuf,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RouterConfig::from_env()?;

    match cli.command {
        Commands::Trade {
            symbol,
            action,
            units,
            sl_pips,
            tp_pips,
        } => {
            let desk = SignalDesk::from_config(&config)?;
            let payload = TradeIntentPayload {
                symbol,
                action,
                units,
                sl_pips,
                tp_pips,
            };

            match desk.execute_trade(payload).await {
                Ok(execution) => print_json(&execution)?,
                Err(e) => {
                    print_json(&e)?;
                    anyhow::bail!("{}", e);
                }
            }
        }

        Commands::Status => {
            let desk = SignalDesk::from_config(&config)?;
            let status = desk.get_status().await;
            print_json(&status)?;
        }

        Commands::Classify { symbol } => match config.classifier().classify(&symbol) {
            Ok(exchange) => println!("{} -> {}", symbol, exchange),
            Err(e) => println!("{}", e),
        },

        Commands::Bracket {
            price,
            action,
            sl_pips,
            tp_pips,
            pip_model,
        } => {
            let model = match pip_model {
                Some(s) => s.parse::<PipModel>().context("Invalid --pip-model")?,
                None => config.pip_model,
            };
            let action: TradeAction = action.parse()?;
            let levels =
                RiskCalculator::new(model).compute_bracket(price, action, sl_pips, tp_pips)?;

            println!("\n=== Bracket ({} @ {}) ===", action, price);
            println!("Stop Loss:    {}", levels.stop_price);
            println!("Take Profit:  {}", levels.target_price);
        }

        Commands::Market => {
            let status = forex_market_status(chrono::Utc::now());

            println!("\n=== Forex Market ===");
            println!("Open:         {}", if status.is_open { "Yes" } else { "No" });
            println!("New York:     {}", status.current_time.format("%a %Y-%m-%d %H:%M"));
            if let Some(open) = status.next_open {
                println!("Next Open:    {}", open.format("%a %Y-%m-%d %H:%M"));
            }
            if let Some(close) = status.next_close {
                println!("Next Close:   {}", close.format("%a %Y-%m-%d %H:%M"));
            }
            println!("Sessions:     {}", status.current_session);
        }

        Commands::Replay { file } => {
            let desk = SignalDesk::from_config(&config)?;
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut executed = 0;
            let mut failed = 0;
            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let payload: TradeIntentPayload = match serde_json::from_str(line) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(line = line_no + 1, error = %e, "Skipping malformed signal");
                        failed += 1;
                        continue;
                    }
                };
                match desk.execute_trade(payload).await {
                    Ok(_) => executed += 1,
                    Err(_) => failed += 1,
                }
            }

            info!(executed = executed, failed = failed, "Replay finished");

            println!("\n=== Replay ===");
            println!("Executed:     {}", executed);
            println!("Failed:       {}", failed);

            let signals = desk.signals();
            println!(
                "\n=== Recent Signals ({}/{}) ===",
                signals.len().await,
                signals.capacity()
            );
            for signal in signals.snapshot().await {
                println!(
                    "  {} {} {} x {}",
                    signal.at.format("%H:%M:%S"),
                    signal.entry.action.to_uppercase(),
                    signal.entry.symbol,
                    signal.entry.units
                );
            }

            let trades = desk.trades();
            println!(
                "\n=== Recent Trades ({}/{}) ===",
                trades.len().await,
                trades.capacity()
            );
            for trade in trades.snapshot().await {
                let record = &trade.entry;
                match (&record.execution, &record.error) {
                    (Some(exec), _) => println!(
                        "  {} {} {} filled @ {} (bracket: {})",
                        trade.at.format("%H:%M:%S"),
                        record.symbol,
                        exec.exchange(),
                        exec.entry
                            .filled_price
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        bracket_label(&exec.bracket)
                    ),
                    (None, Some(e)) => println!(
                        "  {} {} FAILED: {}",
                        trade.at.format("%H:%M:%S"),
                        record.symbol,
                        e
                    ),
                    (None, None) => {}
                }
            }
        }

        Commands::Config => {
            println!("\n=== Router Configuration ===\n");
            println!("Forex (OANDA):");
            match &config.oanda {
                Some(o) => {
                    println!("  Account:              {}", o.account_id);
                    println!("  Environment:          {}", o.environment);
                }
                None => println!("  Not configured"),
            }

            println!("\nCrypto (Binance):");
            match &config.binance {
                Some(b) => println!("  Testnet:              {}", b.testnet),
                None => println!("  Not configured"),
            }

            println!("\nRisk:");
            match config.pip_model {
                PipModel::PercentageOfPrice { pip_unit } => {
                    println!("  Pip Model:            percentage of price ({})", pip_unit)
                }
                PipModel::FixedTick { tick_size } => {
                    println!("  Pip Model:            fixed tick ({})", tick_size)
                }
            }

            println!("\nSymbol Rules (first match wins):");
            for rule in config.classifier().rules() {
                println!("  {:<22} -> {}", rule.name, rule.exchange);
            }

            println!("\nGeneral:");
            println!("  Quote Currency:       {}", config.quote_currency);
            println!("  History Size:         {}", config.history_size);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn bracket_label(outcome: &models::BracketOutcome) -> &'static str {
    match outcome {
        models::BracketOutcome::NotRequested => "none",
        models::BracketOutcome::Skipped { .. } => "skipped",
        models::BracketOutcome::Attached(_) => "attached",
        models::BracketOutcome::Failed { .. } => "FAILED",
    }
}
