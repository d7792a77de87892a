//! Binance spot REST client implementing [`CryptoVenue`].
//!
//! Signed endpoints carry a `timestamp` and an HMAC-SHA256 `signature` over the
//! query string, with the API key in the `X-MBX-APIKEY` header.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde_json::Value;
use sha2::Sha256;
use tracing::debug;

use crate::models::TradeAction;

use super::types::*;
use super::CryptoVenue;

pub const LIVE_URL: &str = "https://api.binance.com";
pub const TESTNET_URL: &str = "https://testnet.binance.vision";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const RECV_WINDOW_MS: u64 = 5000;

/// Binance error code for a symbol the exchange does not list.
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Client for Binance spot trading.
pub struct BinanceClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl BinanceClient {
    pub fn new(api_key: &str, api_secret: &str, testnet: bool) -> Result<Self> {
        let base_url = if testnet { TESTNET_URL } else { LIVE_URL };
        Self::with_base_url(api_key, api_secret, base_url.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(api_key: &str, api_secret: &str, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    /// Hex HMAC-SHA256 of `payload` keyed with the API secret.
    fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .context("Invalid API secret")?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn encode_query(params: &[(&str, String)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    async fn read_json(resp: Response, what: &str) -> Result<Value> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<BinanceErrorBody>(&text) {
                return Err(anyhow::Error::new(err).context(format!("{} failed", what)));
            }
            bail!("{} failed: {} - {}", what, status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse {} response", what))
    }

    async fn public_get(&self, path: &str, params: &[(&str, String)], what: &str) -> Result<Value> {
        let mut url = format!("{}{}", self.base_url, path);
        if !params.is_empty() {
            url = format!("{}?{}", url, Self::encode_query(params));
        }
        debug!(url = %url, "Binance request");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        Self::read_json(resp, what).await
    }

    async fn signed(
        &self,
        method: Method,
        path: &str,
        mut params: Vec<(&str, String)>,
        what: &str,
    ) -> Result<Value> {
        params.push(("recvWindow", RECV_WINDOW_MS.to_string()));
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let query = Self::encode_query(&params);
        let signature = self.sign(&query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);
        debug!(path = %path, method = %method, "Binance signed request");

        let resp = self
            .http
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        Self::read_json(resp, what).await
    }

    fn client_order_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

fn is_unknown_symbol(err: &anyhow::Error) -> bool {
    err.downcast_ref::<BinanceErrorBody>()
        .is_some_and(|body| body.code == INVALID_SYMBOL_CODE)
}

#[async_trait]
impl CryptoVenue for BinanceClient {
    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>> {
        let raw = self
            .public_get(
                "/api/v3/exchangeInfo",
                &[("symbol", symbol.to_string())],
                "Exchange info",
            )
            .await;

        // Unknown symbols come back as an error body rather than an empty list.
        let raw = match raw {
            Ok(v) => v,
            Err(e) if is_unknown_symbol(&e) => return Ok(None),
            Err(e) => return Err(e),
        };

        let info: BinanceExchangeInfo =
            serde_json::from_value(raw).context("Failed to parse exchange info")?;
        Ok(info.symbols.into_iter().find(|s| s.symbol == symbol))
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: TradeAction,
        quantity: Decimal,
    ) -> Result<CryptoOrderAck> {
        let params = vec![
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("newClientOrderId", Self::client_order_id()),
            ("newOrderRespType", "FULL".to_string()),
        ];

        let raw = self
            .signed(Method::POST, "/api/v3/order", params, "Market order")
            .await?;
        let parsed: BinanceOrderResponse =
            serde_json::from_value(raw.clone()).context("Failed to parse order response")?;

        Ok(CryptoOrderAck {
            order_id: parsed.order_id,
            fills: parsed.fills,
            raw,
        })
    }

    async fn place_stop_limit_order(
        &self,
        symbol: &str,
        side: TradeAction,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Result<Value> {
        let params = vec![
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "STOP_LOSS_LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("price", limit_price.normalize().to_string()),
            ("stopPrice", stop_price.normalize().to_string()),
            ("newClientOrderId", Self::client_order_id()),
        ];

        self.signed(Method::POST, "/api/v3/order", params, "Stop-limit order")
            .await
    }

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: TradeAction,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Value> {
        let params = vec![
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("price", price.normalize().to_string()),
            ("newClientOrderId", Self::client_order_id()),
        ];

        self.signed(Method::POST, "/api/v3/order", params, "Limit order")
            .await
    }

    async fn account_info(&self) -> Result<CryptoAccountInfo> {
        let raw = self
            .signed(Method::GET, "/api/v3/account", vec![], "Account info")
            .await?;
        serde_json::from_value(raw).context("Failed to parse account info")
    }

    async fn ticker_price(&self, symbol: &str) -> Result<Decimal> {
        let raw = self
            .public_get(
                "/api/v3/ticker/price",
                &[("symbol", symbol.to_string())],
                "Ticker price",
            )
            .await?;
        let ticker: BinanceTicker =
            serde_json::from_value(raw).context("Failed to parse ticker price")?;
        Ok(ticker.price)
    }
}
