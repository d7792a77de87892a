//! Brokerage venue interfaces and their REST clients.
//!
//! Adapters only ever talk to a venue through [`ForexVenue`] or [`CryptoVenue`],
//! so tests can substitute fakes without a network.

mod binance_client;
mod oanda_client;
mod types;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::models::TradeAction;

pub use binance_client::BinanceClient;
pub use oanda_client::OandaClient;
pub use types::*;

/// Remote operations needed from a forex-style brokerage.
#[async_trait]
pub trait ForexVenue: Send + Sync {
    async fn place_market_order(&self, order: &ForexOrderRequest) -> Result<ForexFill>;

    /// Attach good-till-cancelled stop-loss and take-profit orders to an open trade.
    async fn attach_bracket(
        &self,
        trade_id: &str,
        stop_price: Decimal,
        target_price: Decimal,
    ) -> Result<Value>;

    async fn account_summary(&self) -> Result<ForexAccountSummary>;

    async fn open_positions(&self) -> Result<Vec<Value>>;
}

/// Remote operations needed from a crypto-style brokerage.
#[async_trait]
pub trait CryptoVenue: Send + Sync {
    /// `None` when the venue does not list the symbol.
    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>>;

    async fn place_market_order(
        &self,
        symbol: &str,
        side: TradeAction,
        quantity: Decimal,
    ) -> Result<CryptoOrderAck>;

    async fn place_stop_limit_order(
        &self,
        symbol: &str,
        side: TradeAction,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Result<Value>;

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: TradeAction,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Value>;

    async fn account_info(&self) -> Result<CryptoAccountInfo>;

    async fn ticker_price(&self, symbol: &str) -> Result<Decimal>;
}
