//! In-memory venues for adapter, router, and aggregator tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use crate::api::{
    CryptoAccountInfo, CryptoBalance, CryptoFill, CryptoOrderAck, CryptoVenue,
    ForexAccountSummary, ForexFill, ForexOrderRequest, ForexVenue, SymbolInfo,
};
use crate::models::TradeAction;

#[derive(Debug, Clone, PartialEq)]
pub enum ForexCall {
    MarketOrder(ForexOrderRequest),
    AttachBracket {
        trade_id: String,
        stop: Decimal,
        target: Decimal,
    },
}

pub struct FakeForexVenue {
    fill_price: Option<Decimal>,
    trade_opened: bool,
    reject_order: Option<String>,
    reject_attach: Option<String>,
    fail_account: bool,
    calls: Mutex<Vec<ForexCall>>,
}

impl FakeForexVenue {
    pub fn filling_at(price: Decimal) -> Self {
        Self {
            fill_price: Some(price),
            trade_opened: true,
            reject_order: None,
            reject_attach: None,
            fail_account: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject_order: Some(reason.to_string()),
            ..Self::filling_at(dec!(1))
        }
    }

    pub fn failing_attach(mut self, reason: &str) -> Self {
        self.reject_attach = Some(reason.to_string());
        self
    }

    pub fn without_trade_opened(mut self) -> Self {
        self.trade_opened = false;
        self
    }

    pub fn failing_account(mut self) -> Self {
        self.fail_account = true;
        self
    }

    pub fn calls(&self) -> Vec<ForexCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForexVenue for FakeForexVenue {
    async fn place_market_order(&self, order: &ForexOrderRequest) -> Result<ForexFill> {
        self.calls
            .lock()
            .unwrap()
            .push(ForexCall::MarketOrder(order.clone()));

        if let Some(reason) = &self.reject_order {
            return Err(anyhow!("Order placement failed: {}", reason));
        }

        let trade_id = self.trade_opened.then(|| "T-1".to_string());
        Ok(ForexFill {
            filled_price: self.fill_price,
            trade_id: trade_id.clone(),
            raw: json!({
                "orderFillTransaction": {
                    "price": self.fill_price.map(|p| p.to_string()),
                    "tradeOpened": trade_id.map(|id| json!({"tradeID": id})),
                }
            }),
        })
    }

    async fn attach_bracket(
        &self,
        trade_id: &str,
        stop_price: Decimal,
        target_price: Decimal,
    ) -> Result<Value> {
        self.calls.lock().unwrap().push(ForexCall::AttachBracket {
            trade_id: trade_id.to_string(),
            stop: stop_price,
            target: target_price,
        });

        match &self.reject_attach {
            Some(reason) => Err(anyhow!("Bracket attachment failed: {}", reason)),
            None => Ok(json!({"relatedTransactionIDs": ["8", "9"]})),
        }
    }

    async fn account_summary(&self) -> Result<ForexAccountSummary> {
        if self.fail_account {
            return Err(anyhow!("Account summary failed: 401 Unauthorized"));
        }
        Ok(ForexAccountSummary {
            balance: dec!(100000),
            open_trade_count: 2,
            unrealized_pl: dec!(-12.5),
            pl: dec!(340.1),
        })
    }

    async fn open_positions(&self) -> Result<Vec<Value>> {
        Ok(vec![json!({"instrument": "EUR_USD", "long": {"units": "100"}})])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CryptoCall {
    MarketOrder {
        symbol: String,
        side: TradeAction,
        quantity: Decimal,
    },
    StopLimit {
        side: TradeAction,
        quantity: Decimal,
        stop: Decimal,
        limit: Decimal,
    },
    Limit {
        side: TradeAction,
        quantity: Decimal,
        price: Decimal,
    },
}

pub struct FakeCryptoVenue {
    fills: Vec<CryptoFill>,
    listed: bool,
    reject_order: Option<String>,
    reject_stop: Option<String>,
    reject_limit: Option<String>,
    fail_account: bool,
    balances: Vec<CryptoBalance>,
    prices: HashMap<String, Decimal>,
    calls: Mutex<Vec<CryptoCall>>,
}

impl FakeCryptoVenue {
    /// Venue whose market orders fill at the given prices, in order.
    pub fn filling_at(prices: &[Decimal]) -> Self {
        Self {
            fills: prices
                .iter()
                .map(|p| CryptoFill {
                    price: *p,
                    qty: dec!(0.0005),
                })
                .collect(),
            listed: true,
            reject_order: None,
            reject_stop: None,
            reject_limit: None,
            fail_account: false,
            balances: Vec::new(),
            prices: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject_order: Some(reason.to_string()),
            ..Self::filling_at(&[])
        }
    }

    pub fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    pub fn failing_stop(mut self, reason: &str) -> Self {
        self.reject_stop = Some(reason.to_string());
        self
    }

    pub fn failing_limit(mut self, reason: &str) -> Self {
        self.reject_limit = Some(reason.to_string());
        self
    }

    pub fn failing_account(mut self) -> Self {
        self.fail_account = true;
        self
    }

    pub fn with_balance(mut self, asset: &str, free: Decimal, locked: Decimal) -> Self {
        self.balances.push(CryptoBalance {
            asset: asset.to_string(),
            free,
            locked,
        });
        self
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn calls(&self) -> Vec<CryptoCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CryptoVenue for FakeCryptoVenue {
    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>> {
        Ok(self.listed.then(|| SymbolInfo {
            symbol: symbol.to_string(),
            status: "TRADING".to_string(),
        }))
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: TradeAction,
        quantity: Decimal,
    ) -> Result<CryptoOrderAck> {
        self.calls.lock().unwrap().push(CryptoCall::MarketOrder {
            symbol: symbol.to_string(),
            side,
            quantity,
        });

        if let Some(reason) = &self.reject_order {
            return Err(anyhow!("Market order failed: {} (code -2010)", reason));
        }

        Ok(CryptoOrderAck {
            order_id: Some(28),
            fills: self.fills.clone(),
            raw: json!({"orderId": 28, "fills": self.fills.len()}),
        })
    }

    async fn place_stop_limit_order(
        &self,
        _symbol: &str,
        side: TradeAction,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Result<Value> {
        self.calls.lock().unwrap().push(CryptoCall::StopLimit {
            side,
            quantity,
            stop: stop_price,
            limit: limit_price,
        });

        match &self.reject_stop {
            Some(reason) => Err(anyhow!("Stop-limit order failed: {}", reason)),
            None => Ok(json!({"orderId": 29, "type": "STOP_LOSS_LIMIT"})),
        }
    }

    async fn place_limit_order(
        &self,
        _symbol: &str,
        side: TradeAction,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Value> {
        self.calls.lock().unwrap().push(CryptoCall::Limit {
            side,
            quantity,
            price,
        });

        match &self.reject_limit {
            Some(reason) => Err(anyhow!("Limit order failed: {}", reason)),
            None => Ok(json!({"orderId": 30, "type": "LIMIT"})),
        }
    }

    async fn account_info(&self) -> Result<CryptoAccountInfo> {
        if self.fail_account {
            return Err(anyhow!("Account info failed: Invalid API-key (code -2015)"));
        }
        Ok(CryptoAccountInfo {
            can_trade: true,
            balances: self.balances.clone(),
        })
    }

    async fn ticker_price(&self, symbol: &str) -> Result<Decimal> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow!("Ticker price failed: Invalid symbol. (code -1121)"))
    }
}
