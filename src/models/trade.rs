//! Trade intent model: the normalized input to the router.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }

    /// Side used for protective orders closing a position opened with `self`.
    pub fn opposite(&self) -> Self {
        match self {
            TradeAction::Buy => TradeAction::Sell,
            TradeAction::Sell => TradeAction::Buy,
        }
    }

    /// +1 for Buy, -1 for Sell.
    pub fn sign(&self) -> Decimal {
        match self {
            TradeAction::Buy => Decimal::ONE,
            TradeAction::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl FromStr for TradeAction {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(RouterError::invalid_intent(format!(
                "unknown action '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Brokerage family a symbol is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Forex,
    Crypto,
}

impl ExchangeId {
    pub const ALL: [ExchangeId; 2] = [ExchangeId::Forex, ExchangeId::Crypto];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Forex => "forex",
            ExchangeId::Crypto => "crypto",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal as received from the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntentPayload {
    pub symbol: String,

    /// "buy" or "sell", any case
    pub action: String,

    pub units: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl_pips: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_pips: Option<Decimal>,
}

/// Validated trade intent.
///
/// Pip fields are kept independently optional. Whether a bracket is attempted
/// is decided by each adapter's own presence check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeIntent {
    pub symbol: String,
    pub action: TradeAction,
    pub units: Decimal,
    pub stop_pips: Option<Decimal>,
    pub target_pips: Option<Decimal>,
}

impl TradeIntent {
    pub fn new(symbol: impl Into<String>, action: TradeAction, units: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            units,
            stop_pips: None,
            target_pips: None,
        }
    }

    pub fn with_bracket(mut self, stop_pips: Decimal, target_pips: Decimal) -> Self {
        self.stop_pips = Some(stop_pips);
        self.target_pips = Some(target_pips);
        self
    }

    /// Units signed by direction: positive for Buy, negative for Sell.
    pub fn signed_units(&self) -> Decimal {
        self.units * self.action.sign()
    }

    /// True when both pip distances were supplied.
    pub fn has_full_bracket(&self) -> bool {
        self.stop_pips.is_some() && self.target_pips.is_some()
    }
}

impl TryFrom<TradeIntentPayload> for TradeIntent {
    type Error = RouterError;

    fn try_from(payload: TradeIntentPayload) -> Result<Self, Self::Error> {
        let symbol = payload.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(RouterError::invalid_intent("symbol is empty"));
        }

        let action: TradeAction = payload.action.parse()?;

        if payload.units <= Decimal::ZERO {
            return Err(RouterError::invalid_intent(format!(
                "units must be positive, got {}",
                payload.units
            )));
        }

        for (name, pips) in [("sl_pips", payload.sl_pips), ("tp_pips", payload.tp_pips)] {
            if let Some(p) = pips {
                if p < Decimal::ZERO {
                    return Err(RouterError::invalid_intent(format!(
                        "{} must not be negative, got {}",
                        name, p
                    )));
                }
            }
        }

        Ok(Self {
            symbol,
            action,
            units: payload.units,
            stop_pips: payload.sl_pips,
            target_pips: payload.tp_pips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload(action: &str, units: Decimal) -> TradeIntentPayload {
        TradeIntentPayload {
            symbol: "EUR_USD".to_string(),
            action: action.to_string(),
            units,
            sl_pips: None,
            tp_pips: None,
        }
    }

    #[test]
    fn test_action_is_case_insensitive() {
        assert_eq!("BUY".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert_eq!("Sell".parse::<TradeAction>().unwrap(), TradeAction::Sell);
        assert!("hold".parse::<TradeAction>().is_err());
    }

    #[test]
    fn test_signed_units() {
        let buy = TradeIntent::new("EUR_USD", TradeAction::Buy, dec!(100));
        let sell = TradeIntent::new("EUR_USD", TradeAction::Sell, dec!(100));
        assert_eq!(buy.signed_units(), dec!(100));
        assert_eq!(sell.signed_units(), dec!(-100));
    }

    #[test]
    fn test_payload_from_json() {
        let json = r#"{"symbol":"BTCUSDT","action":"buy","units":0.001,"sl_pips":30,"tp_pips":60}"#;
        let payload: TradeIntentPayload = serde_json::from_str(json).unwrap();
        let intent = TradeIntent::try_from(payload).unwrap();

        assert_eq!(intent.symbol, "BTCUSDT");
        assert_eq!(intent.action, TradeAction::Buy);
        assert_eq!(intent.units, dec!(0.001));
        assert_eq!(intent.stop_pips, Some(dec!(30)));
        assert_eq!(intent.target_pips, Some(dec!(60)));
        assert!(intent.has_full_bracket());
    }

    #[test]
    fn test_rejects_non_positive_units() {
        assert!(TradeIntent::try_from(payload("buy", dec!(0))).is_err());
        assert!(TradeIntent::try_from(payload("buy", dec!(-5))).is_err());
    }

    #[test]
    fn test_rejects_negative_pips() {
        let mut p = payload("sell", dec!(10));
        p.sl_pips = Some(dec!(-1));
        let err = TradeIntent::try_from(p).unwrap_err();
        assert!(matches!(err, RouterError::InvalidIntent { .. }));
    }

    #[test]
    fn test_single_pip_field_is_accepted() {
        let mut p = payload("buy", dec!(10));
        p.sl_pips = Some(dec!(20));
        let intent = TradeIntent::try_from(p).unwrap();
        assert!(!intent.has_full_bracket());
        assert_eq!(intent.target_pips, None);
    }
}
