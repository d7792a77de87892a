//! Data models for intents, executions, and account state.

mod account;
mod execution;
mod trade;

pub use account::{
    AccountSnapshot, AssetBalance, CryptoAccount, ExchangeSlot, ForexAccount, StatusReport,
};
pub use execution::{BracketInfo, BracketLevels, BracketOutcome, TradeExecution, TradeResult};
pub use trade::{ExchangeId, TradeAction, TradeIntent, TradeIntentPayload};
