//! OANDA v20 REST client implementing [`ForexVenue`].

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use super::types::*;
use super::ForexVenue;

pub const PRACTICE_URL: &str = "https://api-fxpractice.oanda.com";
pub const LIVE_URL: &str = "https://api-fxtrade.oanda.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a single OANDA account.
pub struct OandaClient {
    http: Client,
    base_url: String,
    api_key: String,
    account_id: String,
}

impl OandaClient {
    /// Create a client for the `practice` or `live` environment.
    pub fn new(api_key: &str, account_id: &str, environment: &str) -> Result<Self> {
        let base_url = match environment.to_lowercase().as_str() {
            "practice" | "demo" => PRACTICE_URL,
            "live" | "trade" => LIVE_URL,
            other => bail!("Unknown OANDA environment: {}", other),
        };
        Self::with_base_url(api_key, account_id, base_url.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(api_key: &str, account_id: &str, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
            account_id: account_id.to_string(),
        })
    }

    fn account_url(&self, path: &str) -> String {
        format!("{}/v3/accounts/{}{}", self.base_url, self.account_id, path)
    }

    /// Read the body as JSON, turning non-2xx responses into errors.
    async fn read_json(resp: Response, what: &str) -> Result<Value> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("errorMessage")?.as_str().map(str::to_string))
                .unwrap_or(text);
            bail!("{} failed: {} - {}", what, status, message);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse {} response", what))
    }

    async fn get(&self, path: &str, what: &str) -> Result<Value> {
        let url = self.account_url(path);
        debug!(url = %url, "OANDA request");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        Self::read_json(resp, what).await
    }
}

#[async_trait]
impl ForexVenue for OandaClient {
    async fn place_market_order(&self, order: &ForexOrderRequest) -> Result<ForexFill> {
        let body = OandaOrderRequest {
            order: OandaOrderBody {
                order_type: "MARKET",
                instrument: order.instrument.clone(),
                units: order.units.normalize().to_string(),
                time_in_force: order.time_in_force,
                position_fill: order.position_fill,
                client_extensions: OandaClientExtensions {
                    id: order.client_id.clone(),
                },
            },
        };

        let url = self.account_url("/orders");
        debug!(
            url = %url,
            instrument = %order.instrument,
            units = %order.units,
            "Placing OANDA market order"
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send order request")?;

        let raw = Self::read_json(resp, "Order placement").await?;
        let parsed: OandaOrderResponse =
            serde_json::from_value(raw.clone()).context("Failed to parse order response")?;

        let Some(fill) = parsed.order_fill_transaction else {
            let reason = parsed
                .order_cancel_transaction
                .map(|c| c.reason)
                .unwrap_or_else(|| "no fill reported".to_string());
            return Err(anyhow!("Order was not filled: {}", reason));
        };

        Ok(ForexFill {
            filled_price: fill.price,
            trade_id: fill.trade_opened.map(|t| t.trade_id),
            raw,
        })
    }

    async fn attach_bracket(
        &self,
        trade_id: &str,
        stop_price: Decimal,
        target_price: Decimal,
    ) -> Result<Value> {
        let body = OandaDependentOrders {
            stop_loss: OandaPriceDetails {
                price: stop_price.to_string(),
                time_in_force: TimeInForce::Gtc,
            },
            take_profit: OandaPriceDetails {
                price: target_price.to_string(),
                time_in_force: TimeInForce::Gtc,
            },
        };

        let url = self.account_url(&format!("/trades/{}/orders", trade_id));
        debug!(url = %url, stop = %stop_price, target = %target_price, "Attaching OANDA bracket");

        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send bracket request")?;

        Self::read_json(resp, "Bracket attachment").await
    }

    async fn account_summary(&self) -> Result<ForexAccountSummary> {
        let raw = self.get("/summary", "Account summary").await?;
        let parsed: OandaAccountSummaryResponse =
            serde_json::from_value(raw).context("Failed to parse account summary")?;

        Ok(ForexAccountSummary {
            balance: parsed.account.balance,
            open_trade_count: parsed.account.open_trade_count,
            unrealized_pl: parsed.account.unrealized_pl,
            pl: parsed.account.pl,
        })
    }

    async fn open_positions(&self) -> Result<Vec<Value>> {
        let raw = self.get("/openPositions", "Open positions").await?;
        let parsed: OandaPositionsResponse =
            serde_json::from_value(raw).context("Failed to parse open positions")?;
        Ok(parsed.positions)
    }
}
