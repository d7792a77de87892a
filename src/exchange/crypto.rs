//! Crypto-style adapter: market order, then a stop-limit and a limit order on
//! the opposite side as the protective bracket.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::api::CryptoVenue;
use crate::error::RouterError;
use crate::models::{
    AccountSnapshot, AssetBalance, BracketInfo, BracketOutcome, CryptoAccount, ExchangeId,
    TradeExecution, TradeIntent, TradeResult,
};
use crate::trading::RiskCalculator;

use super::ExchangeAdapter;

pub struct CryptoAdapter {
    venue: Arc<dyn CryptoVenue>,
    risk: RiskCalculator,
    quote_currency: String,
}

impl CryptoAdapter {
    pub fn new(venue: Arc<dyn CryptoVenue>, risk: RiskCalculator, quote_currency: &str) -> Self {
        Self {
            venue,
            risk,
            quote_currency: quote_currency.to_uppercase(),
        }
    }

    fn execution_error(cause: impl Into<String>) -> RouterError {
        RouterError::ExchangeExecutionFailed {
            exchange: ExchangeId::Crypto,
            cause: cause.into(),
        }
    }

    /// Reject symbols the venue does not list before any order is sent.
    async fn check_symbol(&self, symbol: &str) -> Result<(), RouterError> {
        let info = self
            .venue
            .symbol_info(symbol)
            .await
            .map_err(|e| RouterError::execution(ExchangeId::Crypto, &e))?;

        match info {
            Some(info) if info.is_trading() => Ok(()),
            Some(info) => Err(Self::execution_error(format!(
                "symbol {} is not trading (status {})",
                symbol, info.status
            ))),
            None => Err(Self::execution_error(format!(
                "symbol {} is not listed",
                symbol
            ))),
        }
    }

    /// Second phase. Only the stop distance is checked for presence; the
    /// target distance is read as-is, so a stop-only intent fails here after
    /// the entry has already filled.
    async fn place_bracket(
        &self,
        intent: &TradeIntent,
        filled_price: Option<Decimal>,
    ) -> BracketOutcome {
        let Some(stop_pips) = intent.stop_pips else {
            return BracketOutcome::NotRequested;
        };
        let Some(filled_price) = filled_price else {
            return BracketOutcome::Skipped {
                reason: "market order reported no fills".to_string(),
            };
        };
        let Some(target_pips) = intent.target_pips else {
            return BracketOutcome::Failed {
                levels: None,
                placed: Vec::new(),
                error: RouterError::invalid_intent("tp_pips is required when sl_pips is set"),
            };
        };

        let levels = match self
            .risk
            .compute_bracket(filled_price, intent.action, stop_pips, target_pips)
        {
            Ok(levels) => levels,
            Err(error) => {
                return BracketOutcome::Failed {
                    levels: None,
                    placed: Vec::new(),
                    error,
                }
            }
        };

        let exit_side = intent.action.opposite();

        let stop_ack = match self
            .venue
            .place_stop_limit_order(
                &intent.symbol,
                exit_side,
                intent.units,
                levels.stop_price,
                levels.stop_price,
            )
            .await
        {
            Ok(ack) => ack,
            Err(e) => {
                return BracketOutcome::Failed {
                    levels: Some(levels),
                    placed: Vec::new(),
                    error: RouterError::execution(ExchangeId::Crypto, &e),
                }
            }
        };

        match self
            .venue
            .place_limit_order(&intent.symbol, exit_side, intent.units, levels.target_price)
            .await
        {
            Ok(target_ack) => BracketOutcome::Attached(BracketInfo {
                levels,
                acknowledgements: vec![stop_ack, target_ack],
            }),
            Err(e) => BracketOutcome::Failed {
                levels: Some(levels),
                placed: vec![stop_ack],
                error: RouterError::execution(ExchangeId::Crypto, &e),
            },
        }
    }

    /// Value one asset in the quote currency. A failed price lookup counts as
    /// zero and marks the balance unpriced instead of failing the snapshot.
    async fn value_asset(&self, asset: &str, total: Decimal) -> (Decimal, bool) {
        if asset == self.quote_currency {
            return (total, true);
        }

        let symbol = format!("{}{}", asset, self.quote_currency);
        match self.venue.ticker_price(&symbol).await {
            Ok(price) => match total.checked_mul(price) {
                Some(value) => (value, true),
                None => {
                    warn!(
                        asset = %asset,
                        price = %price,
                        "Asset value out of range, valuing at zero"
                    );
                    (Decimal::ZERO, false)
                }
            },
            Err(e) => {
                warn!(
                    asset = %asset,
                    symbol = %symbol,
                    error = %e,
                    "No price for asset, valuing at zero"
                );
                (Decimal::ZERO, false)
            }
        }
    }
}

#[async_trait]
impl ExchangeAdapter for CryptoAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Crypto
    }

    async fn execute(&self, intent: &TradeIntent) -> Result<TradeExecution, RouterError> {
        self.check_symbol(&intent.symbol).await?;

        let ack = self
            .venue
            .place_market_order(&intent.symbol, intent.action, intent.units)
            .await
            .map_err(|e| RouterError::execution(ExchangeId::Crypto, &e))?;

        let filled_price = ack.first_fill_price();
        info!(
            symbol = %intent.symbol,
            side = %intent.action,
            quantity = %intent.units,
            price = ?filled_price,
            fills = ack.fills.len(),
            filled = %ack.filled_quantity(),
            "Crypto market order placed"
        );

        let bracket = self.place_bracket(intent, filled_price).await;
        match &bracket {
            BracketOutcome::Failed { error, placed, .. } => warn!(
                symbol = %intent.symbol,
                error = %error,
                placed = placed.len(),
                "Entry filled but bracket was not fully placed"
            ),
            BracketOutcome::Skipped { reason } => {
                warn!(symbol = %intent.symbol, reason = %reason, "Bracket skipped")
            }
            _ => {}
        }

        let entry = TradeResult {
            exchange_used: ExchangeId::Crypto,
            symbol: intent.symbol.clone(),
            action: intent.action,
            units: intent.units,
            filled_price,
            stop_price: None,
            target_price: None,
            position_id: ack.order_id.map(|id| id.to_string()),
            raw_exchange_response: ack.raw,
        };

        Ok(TradeExecution::new(entry, bracket))
    }

    async fn account_snapshot(&self) -> Result<AccountSnapshot, RouterError> {
        let account = self
            .venue
            .account_info()
            .await
            .map_err(|e| RouterError::account_query(ExchangeId::Crypto, &e))?;

        let mut balances = BTreeMap::new();
        let mut total_value = Decimal::ZERO;

        for balance in account.balances {
            let total = balance.free.saturating_add(balance.locked);
            if total <= Decimal::ZERO {
                continue;
            }

            let (value, priced) = self.value_asset(&balance.asset, total).await;
            debug!(asset = %balance.asset, total = %total, value = %value, "Valued asset");
            total_value = total_value.saturating_add(value);

            balances.insert(
                balance.asset,
                AssetBalance {
                    free: balance.free,
                    locked: balance.locked,
                    total,
                    value_in_quote: value,
                    priced,
                },
            );
        }

        Ok(AccountSnapshot::Crypto(CryptoAccount {
            quote_currency: self.quote_currency.clone(),
            total_value_in_quote: total_value,
            trading_enabled: account.can_trade,
            balances,
        }))
    }
}
