//! Runtime configuration, read from the environment (and `.env`).

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::activity::DEFAULT_HISTORY_SIZE;
use crate::trading::{ClassifierRule, PipModel, SymbolClassifier};

/// Forex venue (OANDA v20) credentials.
#[derive(Debug, Clone, Serialize)]
pub struct OandaConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub account_id: String,

    /// "practice" or "live"
    pub environment: String,
}

/// Crypto venue (Binance spot) credentials.
#[derive(Debug, Clone, Serialize)]
pub struct BinanceConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub testnet: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterConfig {
    /// None when the credentials are not set; the venue is then unconfigured
    pub oanda: Option<OandaConfig>,
    pub binance: Option<BinanceConfig>,

    /// Currency crypto holdings are valued in
    pub quote_currency: String,

    /// Entries retained per activity log
    pub history_size: usize,

    pub pip_model: PipModel,

    /// Extra routing rules, checked before the built-in ones
    pub symbol_rules: Vec<ClassifierRule>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            oanda: None,
            binance: None,
            quote_currency: "USDT".to_string(),
            history_size: DEFAULT_HISTORY_SIZE,
            pip_model: PipModel::default(),
            symbol_rules: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Build from process environment variables:
    /// - OANDA_API_KEY, OANDA_ACCOUNT_ID, OANDA_ENVIRONMENT (defaults to practice)
    /// - BINANCE_API_KEY, BINANCE_API_SECRET, BINANCE_TESTNET (defaults to true)
    /// - QUOTE_CURRENCY (defaults to USDT)
    /// - HISTORY_SIZE (defaults to 50)
    /// - PIP_MODEL (`percentage` or `tick:<size>`)
    /// - SYMBOL_RULES (comma-separated `<exchange>:<contains|suffix>:<text>`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let oanda = match (var("OANDA_API_KEY"), var("OANDA_ACCOUNT_ID")) {
            (Some(api_key), Some(account_id)) => Some(OandaConfig {
                api_key,
                account_id,
                environment: var("OANDA_ENVIRONMENT").unwrap_or_else(|| "practice".to_string()),
            }),
            _ => None,
        };

        let binance = match (var("BINANCE_API_KEY"), var("BINANCE_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => Some(BinanceConfig {
                api_key,
                api_secret,
                testnet: match var("BINANCE_TESTNET") {
                    Some(v) => parse_bool(&v).context("Invalid BINANCE_TESTNET")?,
                    None => true,
                },
            }),
            _ => None,
        };

        let history_size = match var("HISTORY_SIZE") {
            Some(v) => v.trim().parse().context("Invalid HISTORY_SIZE")?,
            None => defaults.history_size,
        };

        let pip_model = match var("PIP_MODEL") {
            Some(v) => v.parse::<PipModel>().context("Invalid PIP_MODEL")?,
            None => defaults.pip_model,
        };

        let symbol_rules = match var("SYMBOL_RULES") {
            Some(v) => v
                .split(',')
                .filter(|r| !r.trim().is_empty())
                .map(|r| r.parse::<ClassifierRule>())
                .collect::<Result<Vec<_>>>()
                .context("Invalid SYMBOL_RULES")?,
            None => defaults.symbol_rules,
        };

        Ok(Self {
            oanda,
            binance,
            quote_currency: var("QUOTE_CURRENCY")
                .map(|q| q.trim().to_uppercase())
                .unwrap_or(defaults.quote_currency),
            history_size,
            pip_model,
            symbol_rules,
        })
    }

    /// Built-in routing rules with the configured rules taking priority, in
    /// the order they were listed.
    pub fn classifier(&self) -> SymbolClassifier {
        self.symbol_rules
            .iter()
            .rev()
            .cloned()
            .fold(SymbolClassifier::default(), SymbolClassifier::with_priority_rule)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExchangeId;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<RouterConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RouterConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = config(&[]).unwrap();

        assert!(config.oanda.is_none());
        assert!(config.binance.is_none());
        assert_eq!(config.quote_currency, "USDT");
        assert_eq!(config.history_size, 50);
        assert_eq!(config.pip_model, PipModel::default());
    }

    #[test]
    fn test_full_environment() {
        let config = config(&[
            ("OANDA_API_KEY", "token"),
            ("OANDA_ACCOUNT_ID", "101-001-1"),
            ("BINANCE_API_KEY", "key"),
            ("BINANCE_API_SECRET", "secret"),
            ("BINANCE_TESTNET", "false"),
            ("QUOTE_CURRENCY", "busd"),
            ("HISTORY_SIZE", "10"),
            ("PIP_MODEL", "tick:0.01"),
        ])
        .unwrap();

        let oanda = config.oanda.unwrap();
        assert_eq!(oanda.environment, "practice");
        assert_eq!(oanda.account_id, "101-001-1");
        assert!(!config.binance.unwrap().testnet);
        assert_eq!(config.quote_currency, "BUSD");
        assert_eq!(config.history_size, 10);
        assert_eq!(
            config.pip_model,
            PipModel::FixedTick {
                tick_size: dec!(0.01)
            }
        );
    }

    #[test]
    fn test_partial_credentials_leave_venue_unconfigured() {
        let config =
            config(&[("OANDA_API_KEY", "token"), ("BINANCE_API_SECRET", "s")]).unwrap();
        assert!(config.oanda.is_none());
        assert!(config.binance.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("HISTORY_SIZE", "many")]).is_err());
        assert!(config(&[("PIP_MODEL", "fibonacci")]).is_err());
        assert!(config(&[
            ("BINANCE_API_KEY", "k"),
            ("BINANCE_API_SECRET", "s"),
            ("BINANCE_TESTNET", "maybe"),
        ])
        .is_err());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let config = config(&[("BINANCE_API_KEY", "k"), ("BINANCE_API_SECRET", "s")]).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("\"s\""));
        assert!(json.contains("testnet"));
    }

    #[test]
    fn test_symbol_rules_take_priority_in_order() {
        let config = config(&[(
            "SYMBOL_RULES",
            "crypto:suffix:_USDT, forex:contains:USD_USDT,crypto:contains:BUSD|USDC",
        )])
        .unwrap();
        assert_eq!(config.symbol_rules.len(), 3);

        let classifier = config.classifier();
        assert_eq!(classifier.rules().len(), 5);
        assert_eq!(classifier.rules()[0].name, "crypto:suffix:_USDT");
        assert_eq!(classifier.classify("USD_USDT").unwrap(), ExchangeId::Crypto);
        assert_eq!(classifier.classify("ETHBUSD").unwrap(), ExchangeId::Crypto);
        assert_eq!(classifier.classify("EUR_USD").unwrap(), ExchangeId::Forex);
    }

    #[test]
    fn test_invalid_symbol_rule_is_rejected() {
        assert!(config(&[("SYMBOL_RULES", "crypto:prefix:X")]).is_err());
    }
}
