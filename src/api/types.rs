//! Request/response types shared by the venue traits and the REST clients.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order time-in-force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Fill-or-kill: execute immediately and completely or not at all
    Fok,
    /// Good-till-cancelled
    Gtc,
}

/// How a forex fill interacts with existing positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionFill {
    /// Venue default netting behavior
    Default,
}

/// Market order on the forex venue. `units` is signed: negative sells.
#[derive(Debug, Clone, PartialEq)]
pub struct ForexOrderRequest {
    pub instrument: String,
    pub units: Decimal,
    pub time_in_force: TimeInForce,
    pub position_fill: PositionFill,
    pub client_id: String,
}

/// What the forex venue reported for a market order.
#[derive(Debug, Clone, PartialEq)]
pub struct ForexFill {
    pub filled_price: Option<Decimal>,
    /// Trade opened by the fill; absent when the fill only reduced a position
    pub trade_id: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForexAccountSummary {
    pub balance: Decimal,
    pub open_trade_count: u32,
    pub unrealized_pl: Decimal,
    pub pl: Decimal,
}

/// Trading rules for a crypto symbol.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
}

impl SymbolInfo {
    pub fn is_trading(&self) -> bool {
        self.status.eq_ignore_ascii_case("TRADING")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CryptoFill {
    pub price: Decimal,
    pub qty: Decimal,
}

/// Acknowledgement of a crypto market order.
#[derive(Debug, Clone, PartialEq)]
pub struct CryptoOrderAck {
    pub order_id: Option<i64>,
    pub fills: Vec<CryptoFill>,
    pub raw: Value,
}

impl CryptoOrderAck {
    pub fn first_fill_price(&self) -> Option<Decimal> {
        self.fills.first().map(|f| f.price)
    }

    pub fn filled_quantity(&self) -> Decimal {
        self.fills.iter().map(|f| f.qty).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CryptoBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoAccountInfo {
    pub can_trade: bool,
    pub balances: Vec<CryptoBalance>,
}

// OANDA v20 wire types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OandaOrderBody {
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub instrument: String,
    pub units: String,
    pub time_in_force: TimeInForce,
    pub position_fill: PositionFill,
    pub client_extensions: OandaClientExtensions,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OandaClientExtensions {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OandaOrderRequest {
    pub order: OandaOrderBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OandaPriceDetails {
    pub price: String,
    pub time_in_force: TimeInForce,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OandaDependentOrders {
    pub stop_loss: OandaPriceDetails,
    pub take_profit: OandaPriceDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OandaOrderResponse {
    pub order_fill_transaction: Option<OandaFillTransaction>,
    pub order_cancel_transaction: Option<OandaCancelTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OandaFillTransaction {
    pub price: Option<Decimal>,
    pub trade_opened: Option<OandaTradeOpened>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OandaTradeOpened {
    #[serde(rename = "tradeID")]
    pub trade_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OandaCancelTransaction {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OandaAccountSummaryResponse {
    pub account: OandaAccount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OandaAccount {
    pub balance: Decimal,
    pub open_trade_count: u32,
    #[serde(rename = "unrealizedPL")]
    pub unrealized_pl: Decimal,
    pub pl: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OandaPositionsResponse {
    #[serde(default)]
    pub positions: Vec<Value>,
}

// Binance spot wire types

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BinanceExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BinanceOrderResponse {
    pub order_id: Option<i64>,
    #[serde(default)]
    pub fills: Vec<CryptoFill>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BinanceTicker {
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize, thiserror::Error)]
#[error("{msg} (code {code})")]
pub(crate) struct BinanceErrorBody {
    pub code: i64,
    pub msg: String,
}
