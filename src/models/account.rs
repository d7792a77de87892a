//! Point-in-time account state per exchange and the merged status report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::ExchangeId;

/// Forex-style account state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForexAccount {
    pub balance: Decimal,
    pub open_trade_count: u32,
    pub floating_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub positions: Vec<Value>,
}

/// Holdings of a single asset on the crypto venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetBalance {
    pub free: Decimal,
    pub locked: Decimal,
    pub total: Decimal,
    pub value_in_quote: Decimal,

    /// False when no price could be found and the value was counted as zero
    pub priced: bool,
}

/// Crypto-style account state, valued in the quote currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CryptoAccount {
    pub quote_currency: String,
    pub total_value_in_quote: Decimal,
    pub trading_enabled: bool,
    pub balances: BTreeMap<String, AssetBalance>,
}

impl CryptoAccount {
    /// Assets that were held but could not be priced.
    pub fn unpriced_assets(&self) -> Vec<&str> {
        self.balances
            .iter()
            .filter(|(_, b)| !b.priced)
            .map(|(asset, _)| asset.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AccountSnapshot {
    Forex(ForexAccount),
    Crypto(CryptoAccount),
}

/// One exchange's slot in the status report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExchangeSlot {
    Ready(AccountSnapshot),
    Unavailable { error: String },
}

impl ExchangeSlot {
    pub fn snapshot(&self) -> Option<&AccountSnapshot> {
        match self {
            ExchangeSlot::Ready(s) => Some(s),
            ExchangeSlot::Unavailable { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExchangeSlot::Ready(_) => None,
            ExchangeSlot::Unavailable { error } => Some(error),
        }
    }
}

/// Merged account view across every exchange.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub exchanges: BTreeMap<ExchangeId, ExchangeSlot>,
}

impl StatusReport {
    pub fn slot(&self, exchange: ExchangeId) -> Option<&ExchangeSlot> {
        self.exchanges.get(&exchange)
    }

    pub fn forex(&self) -> Option<&ForexAccount> {
        match self.slot(ExchangeId::Forex)?.snapshot()? {
            AccountSnapshot::Forex(a) => Some(a),
            _ => None,
        }
    }

    pub fn crypto(&self) -> Option<&CryptoAccount> {
        match self.slot(ExchangeId::Crypto)?.snapshot()? {
            AccountSnapshot::Crypto(a) => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_report_serializes_slots_by_exchange_name() {
        let mut exchanges = BTreeMap::new();
        exchanges.insert(
            ExchangeId::Forex,
            ExchangeSlot::Unavailable {
                error: "timeout".to_string(),
            },
        );
        exchanges.insert(
            ExchangeId::Crypto,
            ExchangeSlot::Ready(AccountSnapshot::Crypto(CryptoAccount {
                quote_currency: "USDT".to_string(),
                total_value_in_quote: dec!(10),
                trading_enabled: true,
                balances: BTreeMap::new(),
            })),
        );
        let report = StatusReport {
            generated_at: Utc::now(),
            exchanges,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["forex"]["error"], "timeout");
        assert_eq!(json["crypto"]["trading_enabled"], true);
        assert!(report.forex().is_none());
        assert_eq!(report.crypto().unwrap().total_value_in_quote, dec!(10));
    }
}
