//! Execution results: entry fill plus the outcome of the protective bracket.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::RouterError;

use super::{ExchangeId, TradeAction};

/// Stop-loss and take-profit price levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BracketLevels {
    pub stop_price: Decimal,
    pub target_price: Decimal,
}

/// A bracket the venue accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketInfo {
    pub levels: BracketLevels,

    /// Raw venue acknowledgements, one per protective order placed
    pub acknowledgements: Vec<Value>,
}

/// Outcome of the second phase of an execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BracketOutcome {
    /// The intent did not satisfy the adapter's bracket presence check.
    NotRequested,
    /// Requested, but there was nothing to protect (no fill reported).
    Skipped { reason: String },
    Attached(BracketInfo),
    /// The entry filled but the bracket could not be (fully) placed.
    Failed {
        levels: Option<BracketLevels>,
        /// Protective orders already accepted before the failure
        placed: Vec<Value>,
        error: RouterError,
    },
}

impl BracketOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, BracketOutcome::Attached(_))
    }

    pub fn error(&self) -> Option<&RouterError> {
        match self {
            BracketOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Normalized result of the entry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeResult {
    pub exchange_used: ExchangeId,
    pub symbol: String,
    pub action: TradeAction,
    pub units: Decimal,

    /// Execution price reported by the venue, absent if it reported no fill
    pub filled_price: Option<Decimal>,

    /// Present only when a bracket was requested and accepted
    pub stop_price: Option<Decimal>,
    pub target_price: Option<Decimal>,

    /// Venue identifier of the position/trade opened by the fill
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,

    /// Opaque venue payload kept for auditing
    pub raw_exchange_response: Value,
}

/// Entry result together with the bracket outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeExecution {
    pub entry: TradeResult,
    pub bracket: BracketOutcome,
}

impl TradeExecution {
    /// Build an execution, copying attached bracket levels onto the entry.
    pub fn new(mut entry: TradeResult, bracket: BracketOutcome) -> Self {
        match &bracket {
            BracketOutcome::Attached(info) => {
                entry.stop_price = Some(info.levels.stop_price);
                entry.target_price = Some(info.levels.target_price);
            }
            _ => {
                entry.stop_price = None;
                entry.target_price = None;
            }
        }
        Self { entry, bracket }
    }

    pub fn exchange(&self) -> ExchangeId {
        self.entry.exchange_used
    }
}
