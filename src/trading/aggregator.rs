//! Account aggregation across exchanges with per-exchange failure isolation.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

use crate::exchange::SharedAdapter;
use crate::models::{ExchangeId, ExchangeSlot, StatusReport};

pub struct AccountAggregator {
    adapters: Vec<SharedAdapter>,
    /// Exchanges that always get a slot, configured or not
    expected: Vec<ExchangeId>,
}

impl AccountAggregator {
    pub fn new(adapters: Vec<SharedAdapter>) -> Self {
        Self {
            adapters,
            expected: ExchangeId::ALL.to_vec(),
        }
    }

    /// Query every adapter concurrently and merge the results.
    ///
    /// Never fails as a whole: a failing exchange gets an error slot and the
    /// others are reported normally.
    pub async fn aggregate(&self) -> StatusReport {
        let results = join_all(self.adapters.iter().map(|adapter| async move {
            (adapter.exchange(), adapter.account_snapshot().await)
        }))
        .await;

        let mut exchanges = BTreeMap::new();
        for (exchange, result) in results {
            let slot = match result {
                Ok(snapshot) => ExchangeSlot::Ready(snapshot),
                Err(e) => {
                    warn!(exchange = %exchange, error = %e, "Account query failed");
                    ExchangeSlot::Unavailable {
                        error: e.to_string(),
                    }
                }
            };
            exchanges.insert(exchange, slot);
        }

        for exchange in &self.expected {
            exchanges
                .entry(*exchange)
                .or_insert_with(|| ExchangeSlot::Unavailable {
                    error: format!("{} exchange is not configured", exchange),
                });
        }

        info!(
            ready = exchanges.values().filter(|s| s.snapshot().is_some()).count(),
            total = exchanges.len(),
            "Aggregated account status"
        );

        StatusReport {
            generated_at: Utc::now(),
            exchanges,
        }
    }
}
