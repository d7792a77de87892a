//! Trading logic: classification, risk, routing, aggregation, market clock.

mod aggregator;
mod classifier;
mod market_hours;
mod risk;
mod router;

pub use aggregator::AccountAggregator;
pub use classifier::{ClassifierRule, SymbolClassifier};
pub use market_hours::{forex_market_status, MarketStatus};
pub use risk::{PipModel, RiskCalculator};
pub use router::TradeRouter;
