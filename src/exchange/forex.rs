//! Forex-style adapter: signed-unit FOK market order, then a bracket attached
//! to the opened trade.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::{ForexOrderRequest, ForexVenue, PositionFill, TimeInForce};
use crate::error::RouterError;
use crate::models::{
    AccountSnapshot, BracketInfo, BracketOutcome, ExchangeId, ForexAccount, TradeExecution,
    TradeIntent, TradeResult,
};
use crate::trading::RiskCalculator;

use super::ExchangeAdapter;

pub struct ForexAdapter {
    venue: Arc<dyn ForexVenue>,
    risk: RiskCalculator,
}

impl ForexAdapter {
    pub fn new(venue: Arc<dyn ForexVenue>, risk: RiskCalculator) -> Self {
        Self { venue, risk }
    }

    /// Second phase: compute levels from the fill and attach them to the trade.
    async fn attach_bracket(&self, intent: &TradeIntent, entry: &TradeResult) -> BracketOutcome {
        let (Some(stop_pips), Some(target_pips)) = (intent.stop_pips, intent.target_pips) else {
            return BracketOutcome::NotRequested;
        };

        let fail = |levels, error| BracketOutcome::Failed {
            levels,
            placed: Vec::new(),
            error,
        };

        let Some(filled_price) = entry.filled_price else {
            return fail(None, self.bracket_error("venue reported no fill price"));
        };

        let levels = match self
            .risk
            .compute_bracket(filled_price, intent.action, stop_pips, target_pips)
        {
            Ok(levels) => levels,
            Err(e) => return fail(None, e),
        };

        let Some(trade_id) = entry.position_id.as_deref() else {
            return fail(
                Some(levels),
                self.bracket_error("fill did not open a new trade"),
            );
        };

        match self
            .venue
            .attach_bracket(trade_id, levels.stop_price, levels.target_price)
            .await
        {
            Ok(ack) => BracketOutcome::Attached(BracketInfo {
                levels,
                acknowledgements: vec![ack],
            }),
            Err(e) => fail(Some(levels), RouterError::execution(ExchangeId::Forex, &e)),
        }
    }

    fn bracket_error(&self, cause: &str) -> RouterError {
        RouterError::ExchangeExecutionFailed {
            exchange: ExchangeId::Forex,
            cause: cause.to_string(),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for ForexAdapter {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::Forex
    }

    async fn execute(&self, intent: &TradeIntent) -> Result<TradeExecution, RouterError> {
        let order = ForexOrderRequest {
            instrument: intent.symbol.clone(),
            units: intent.signed_units(),
            time_in_force: TimeInForce::Fok,
            position_fill: PositionFill::Default,
            client_id: uuid::Uuid::new_v4().to_string(),
        };

        let fill = self
            .venue
            .place_market_order(&order)
            .await
            .map_err(|e| RouterError::execution(ExchangeId::Forex, &e))?;

        info!(
            instrument = %intent.symbol,
            units = %order.units,
            price = ?fill.filled_price,
            trade_id = ?fill.trade_id,
            "Forex market order filled"
        );

        let entry = TradeResult {
            exchange_used: ExchangeId::Forex,
            symbol: intent.symbol.clone(),
            action: intent.action,
            units: intent.units,
            filled_price: fill.filled_price,
            stop_price: None,
            target_price: None,
            position_id: fill.trade_id,
            raw_exchange_response: fill.raw,
        };

        let bracket = self.attach_bracket(intent, &entry).await;
        if let Some(err) = bracket.error() {
            warn!(
                instrument = %intent.symbol,
                error = %err,
                "Entry filled but bracket was not attached"
            );
        }

        Ok(TradeExecution::new(entry, bracket))
    }

    async fn account_snapshot(&self) -> Result<AccountSnapshot, RouterError> {
        let summary = self
            .venue
            .account_summary()
            .await
            .map_err(|e| RouterError::account_query(ExchangeId::Forex, &e))?;
        let positions = self
            .venue
            .open_positions()
            .await
            .map_err(|e| RouterError::account_query(ExchangeId::Forex, &e))?;

        Ok(AccountSnapshot::Forex(ForexAccount {
            balance: summary.balance,
            open_trade_count: summary.open_trade_count,
            floating_pnl: summary.unrealized_pl,
            realized_pnl: summary.pl,
            positions,
        }))
    }
}
