//! Stop-loss / take-profit level derivation from pip distances.

use std::str::FromStr;

use anyhow::{bail, Context};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RouterError;
use crate::models::{BracketLevels, TradeAction};

/// Size of one pip relative to price under the percentage model.
pub const PERCENTAGE_PIP_UNIT: Decimal = dec!(0.0001);

/// Decimal places bracket prices are rounded to.
pub const PRICE_DECIMALS: u32 = 5;

/// How a pip distance maps to a price distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PipModel {
    /// One pip is `pip_unit` of the reference price, so distances scale with price.
    PercentageOfPrice { pip_unit: Decimal },
    /// One pip is a fixed absolute price increment.
    FixedTick { tick_size: Decimal },
}

impl Default for PipModel {
    fn default() -> Self {
        Self::percentage_of_price()
    }
}

impl PipModel {
    pub fn percentage_of_price() -> Self {
        PipModel::PercentageOfPrice {
            pip_unit: PERCENTAGE_PIP_UNIT,
        }
    }

    /// Absolute price distance covered by `pips` at `reference`, or `None`
    /// when it does not fit in a `Decimal`.
    pub fn distance(&self, reference: Decimal, pips: Decimal) -> Option<Decimal> {
        match self {
            PipModel::PercentageOfPrice { pip_unit } => {
                pips.checked_mul(*pip_unit)?.checked_mul(reference)
            }
            PipModel::FixedTick { tick_size } => pips.checked_mul(*tick_size),
        }
    }
}

impl FromStr for PipModel {
    type Err = anyhow::Error;

    /// Parse `percentage` or `tick:<size>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if matches!(s.as_str(), "percentage" | "percentage_of_price" | "percent") {
            return Ok(Self::percentage_of_price());
        }

        let Some(size) = s.strip_prefix("tick:") else {
            bail!("unknown pip model {:?}, expected percentage or tick:<size>", s);
        };
        let tick_size: Decimal = size
            .parse()
            .with_context(|| format!("invalid tick size {:?}", size))?;
        if tick_size <= Decimal::ZERO {
            bail!("tick size must be positive, got {}", tick_size);
        }
        Ok(PipModel::FixedTick { tick_size })
    }
}

/// Computes bracket levels around a fill price.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskCalculator {
    model: PipModel,
}

impl RiskCalculator {
    pub fn new(model: PipModel) -> Self {
        Self { model }
    }

    /// Stop and target prices for a position opened at `reference`.
    ///
    /// For a buy the stop sits below and the target above the reference; a
    /// sell mirrors both. Results are rounded to five decimals, ties to even.
    pub fn compute_bracket(
        &self,
        reference: Decimal,
        action: TradeAction,
        stop_pips: Decimal,
        target_pips: Decimal,
    ) -> Result<BracketLevels, RouterError> {
        if reference <= Decimal::ZERO {
            return Err(RouterError::InvalidPrice { price: reference });
        }
        if stop_pips < Decimal::ZERO || target_pips < Decimal::ZERO {
            return Err(RouterError::invalid_intent(format!(
                "pip distances must not be negative (stop {}, target {})",
                stop_pips, target_pips
            )));
        }

        let overflow = || {
            RouterError::invalid_intent(format!(
                "pip distances out of range at {} (stop {}, target {})",
                reference, stop_pips, target_pips
            ))
        };

        let stop_distance = self.model.distance(reference, stop_pips).ok_or_else(overflow)?;
        let target_distance = self
            .model
            .distance(reference, target_pips)
            .ok_or_else(overflow)?;

        let (stop, target) = match action {
            TradeAction::Buy => (
                reference.checked_sub(stop_distance),
                reference.checked_add(target_distance),
            ),
            TradeAction::Sell => (
                reference.checked_add(stop_distance),
                reference.checked_sub(target_distance),
            ),
        };
        let (stop, target) = (stop.ok_or_else(overflow)?, target.ok_or_else(overflow)?);

        Ok(BracketLevels {
            stop_price: round_price(stop),
            target_price: round_price(target),
        })
    }
}

fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_bracket_percentage_model() {
        let calc = RiskCalculator::default();
        let levels = calc
            .compute_bracket(dec!(1.0800), TradeAction::Buy, dec!(30), dec!(60))
            .unwrap();

        assert_eq!(levels.stop_price, dec!(1.07676));
        assert_eq!(levels.target_price, dec!(1.08648));
    }

    #[test]
    fn test_sell_mirrors_buy() {
        let calc = RiskCalculator::default();
        let price = dec!(1.0800);
        let buy = calc
            .compute_bracket(price, TradeAction::Buy, dec!(30), dec!(60))
            .unwrap();
        let sell = calc
            .compute_bracket(price, TradeAction::Sell, dec!(30), dec!(60))
            .unwrap();

        assert_eq!(buy.stop_price - price, -(sell.stop_price - price));
        assert_eq!(buy.target_price - price, -(sell.target_price - price));
        assert_eq!(sell.stop_price, dec!(1.08324));
        assert_eq!(sell.target_price, dec!(1.07352));
    }

    #[test]
    fn test_swapping_distances_matches_opposite_side() {
        // A buy's target distance equals a sell's stop distance when swapped.
        let calc = RiskCalculator::default();
        let price = dec!(64250.5);
        let buy = calc
            .compute_bracket(price, TradeAction::Buy, dec!(25), dec!(80))
            .unwrap();
        let sell = calc
            .compute_bracket(price, TradeAction::Sell, dec!(80), dec!(25))
            .unwrap();

        let tolerance = dec!(0.00001);
        assert!((buy.target_price - sell.stop_price).abs() <= tolerance);
        assert!((buy.stop_price - sell.target_price).abs() <= tolerance);
    }

    #[test]
    fn test_rounds_to_five_decimals() {
        let calc = RiskCalculator::default();
        let levels = calc
            .compute_bracket(dec!(1.234567), TradeAction::Buy, dec!(7), dec!(13))
            .unwrap();

        assert!(levels.stop_price.scale() <= PRICE_DECIMALS);
        assert!(levels.target_price.scale() <= PRICE_DECIMALS);
    }

    #[test]
    fn test_zero_pips_returns_reference() {
        let calc = RiskCalculator::default();
        let levels = calc
            .compute_bracket(dec!(1.2), TradeAction::Sell, dec!(0), dec!(0))
            .unwrap();
        assert_eq!(levels.stop_price, dec!(1.2));
        assert_eq!(levels.target_price, dec!(1.2));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let calc = RiskCalculator::default();
        let err = calc
            .compute_bracket(dec!(0), TradeAction::Buy, dec!(30), dec!(60))
            .unwrap_err();
        assert_eq!(err, RouterError::InvalidPrice { price: dec!(0) });
    }

    #[test]
    fn test_fixed_tick_model() {
        let calc = RiskCalculator::new(PipModel::FixedTick {
            tick_size: dec!(0.0001),
        });
        let levels = calc
            .compute_bracket(dec!(1.0800), TradeAction::Buy, dec!(30), dec!(60))
            .unwrap();

        assert_eq!(levels.stop_price, dec!(1.077));
        assert_eq!(levels.target_price, dec!(1.086));
    }

    #[test]
    fn test_pip_model_parsing() {
        assert_eq!("percentage".parse::<PipModel>().unwrap(), PipModel::default());
        assert_eq!(
            " Tick:0.01 ".parse::<PipModel>().unwrap(),
            PipModel::FixedTick {
                tick_size: dec!(0.01)
            }
        );
        assert!("tick:-1".parse::<PipModel>().is_err());
        assert!("tick:abc".parse::<PipModel>().is_err());
        assert!("nonsense".parse::<PipModel>().is_err());
    }

    #[test]
    fn test_out_of_range_pips_are_rejected() {
        let calc = RiskCalculator::default();
        let err = calc
            .compute_bracket(
                dec!(60000),
                TradeAction::Buy,
                Decimal::from_str("70000000000000000000000000000").unwrap(),
                dec!(60),
            )
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidIntent { .. }));

        let tick = RiskCalculator::new(PipModel::FixedTick { tick_size: dec!(10) });
        let err = tick
            .compute_bracket(dec!(1), TradeAction::Sell, dec!(1), Decimal::MAX)
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidIntent { .. }));
    }
}
