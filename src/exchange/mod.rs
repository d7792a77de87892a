//! Exchange adapters: translate a generic trade intent into venue order sequences.

mod crypto;
mod forex;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RouterError;
use crate::models::{AccountSnapshot, ExchangeId, TradeExecution, TradeIntent};

pub use crypto::CryptoAdapter;
pub use forex::ForexAdapter;

/// Common capability surface of every exchange adapter.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn exchange(&self) -> ExchangeId;

    /// Place the entry order and, when requested, its protective bracket.
    ///
    /// An `Err` means the entry itself did not happen. Once the entry has
    /// filled, later failures are reported inside the returned execution.
    async fn execute(&self, intent: &TradeIntent) -> Result<TradeExecution, RouterError>;

    async fn account_snapshot(&self) -> Result<AccountSnapshot, RouterError>;
}

pub type SharedAdapter = Arc<dyn ExchangeAdapter>;
