//! Trade router: classify the symbol, pick the adapter, delegate.

use std::collections::HashMap;

use tracing::info;

use crate::error::RouterError;
use crate::exchange::SharedAdapter;
use crate::models::{ExchangeId, TradeExecution, TradeIntent};

use super::SymbolClassifier;

pub struct TradeRouter {
    classifier: SymbolClassifier,
    adapters: HashMap<ExchangeId, SharedAdapter>,
}

impl TradeRouter {
    pub fn new(classifier: SymbolClassifier) -> Self {
        Self {
            classifier,
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under the exchange it reports.
    pub fn with_adapter(mut self, adapter: SharedAdapter) -> Self {
        self.adapters.insert(adapter.exchange(), adapter);
        self
    }

    pub fn adapter(&self, exchange: ExchangeId) -> Option<&SharedAdapter> {
        self.adapters.get(&exchange)
    }

    /// Single-shot dispatch. Market orders are never retried.
    pub async fn route(&self, intent: &TradeIntent) -> Result<TradeExecution, RouterError> {
        let exchange = self.classifier.classify(&intent.symbol)?;
        let adapter = self
            .adapters
            .get(&exchange)
            .ok_or(RouterError::ExchangeNotConfigured { exchange })?;

        info!(
            symbol = %intent.symbol,
            action = %intent.action,
            units = %intent.units,
            exchange = %exchange,
            "Routing trade"
        );

        adapter.execute(intent).await
    }
}
