//! Signal desk: the entry point a webhook or CLI calls.
//!
//! Owns the router, the account aggregator and the two activity logs.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::activity::{ActivityLog, Timestamped};
use crate::api::{BinanceClient, OandaClient};
use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::exchange::{CryptoAdapter, ForexAdapter, SharedAdapter};
use crate::models::{
    ExchangeId, StatusReport, TradeAction, TradeExecution, TradeIntent, TradeIntentPayload,
};
use crate::trading::{
    forex_market_status, AccountAggregator, MarketStatus, RiskCalculator, SymbolClassifier,
    TradeRouter,
};

/// Outcome of one signal, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<TradeAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<TradeExecution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RouterError>,
}

impl TradeRecord {
    pub fn succeeded(&self) -> bool {
        self.execution.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeskStatus {
    pub exchanges: StatusReport,
    pub market: MarketStatus,
    pub recent_signals: Vec<Timestamped<TradeIntentPayload>>,
    pub recent_trades: Vec<Timestamped<TradeRecord>>,
}

pub struct SignalDesk {
    router: TradeRouter,
    aggregator: AccountAggregator,
    signals: ActivityLog<TradeIntentPayload>,
    trades: ActivityLog<TradeRecord>,
}

impl SignalDesk {
    pub fn new(
        classifier: SymbolClassifier,
        adapters: Vec<SharedAdapter>,
        history_size: usize,
    ) -> Self {
        let router = adapters
            .iter()
            .cloned()
            .fold(TradeRouter::new(classifier), TradeRouter::with_adapter);

        Self {
            router,
            aggregator: AccountAggregator::new(adapters),
            signals: ActivityLog::new(history_size),
            trades: ActivityLog::new(history_size),
        }
    }

    /// Wire up the REST clients for every venue with credentials.
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        let risk = RiskCalculator::new(config.pip_model);
        let mut adapters: Vec<SharedAdapter> = Vec::new();

        match &config.oanda {
            Some(oanda) => {
                let client =
                    OandaClient::new(&oanda.api_key, &oanda.account_id, &oanda.environment)?;
                adapters.push(Arc::new(ForexAdapter::new(Arc::new(client), risk)));
                info!(environment = %oanda.environment, "Forex venue configured");
            }
            None => warn!("OANDA credentials not set, forex venue unavailable"),
        }

        match &config.binance {
            Some(binance) => {
                let client =
                    BinanceClient::new(&binance.api_key, &binance.api_secret, binance.testnet)?;
                adapters.push(Arc::new(CryptoAdapter::new(
                    Arc::new(client),
                    risk,
                    &config.quote_currency,
                )));
                info!(testnet = binance.testnet, "Crypto venue configured");
            }
            None => warn!("Binance credentials not set, crypto venue unavailable"),
        }

        Ok(Self::new(config.classifier(), adapters, config.history_size))
    }

    pub fn is_configured(&self, exchange: ExchangeId) -> bool {
        self.router.adapter(exchange).is_some()
    }

    /// Validate and route a signal, recording it and its outcome.
    pub async fn execute_trade(
        &self,
        payload: TradeIntentPayload,
    ) -> Result<TradeExecution, RouterError> {
        self.signals.record(payload.clone()).await;

        let result = match TradeIntent::try_from(payload.clone()) {
            Ok(intent) => self.router.route(&intent).await,
            Err(e) => Err(e),
        };

        let record = match &result {
            Ok(execution) => {
                if let Some(error) = execution.bracket.error() {
                    warn!(
                        symbol = %payload.symbol,
                        error = %error,
                        "Entry filled without protective bracket"
                    );
                }
                TradeRecord {
                    symbol: payload.symbol.clone(),
                    action: Some(execution.entry.action),
                    execution: Some(execution.clone()),
                    error: None,
                }
            }
            Err(error) => {
                warn!(symbol = %payload.symbol, error = %error, "Trade rejected");
                TradeRecord {
                    symbol: payload.symbol.clone(),
                    action: payload.action.parse().ok(),
                    execution: None,
                    error: Some(error.clone()),
                }
            }
        };
        self.trades.record(record).await;

        result
    }

    pub async fn get_status(&self) -> DeskStatus {
        DeskStatus {
            exchanges: self.aggregator.aggregate().await,
            market: forex_market_status(Utc::now()),
            recent_signals: self.signals.snapshot().await,
            recent_trades: self.trades.snapshot().await,
        }
    }

    pub fn signals(&self) -> &ActivityLog<TradeIntentPayload> {
        &self.signals
    }

    pub fn trades(&self) -> &ActivityLog<TradeRecord> {
        &self.trades
    }
}
