//! Symbol → exchange classification.
//!
//! Rules are evaluated in order and the first match wins. The default rule set
//! is a naming heuristic: underscore-delimited pairs (`EUR_USD`) are forex,
//! anything mentioning `USDT` or `BTC` is crypto.

use std::str::FromStr;

use anyhow::bail;
use serde::Serialize;
use tracing::debug;

use crate::error::RouterError;
use crate::models::ExchangeId;

/// Predicate over a raw symbol string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum SymbolPattern {
    Contains(String),
    ContainsAny(Vec<String>),
    Suffix(String),
}

impl SymbolPattern {
    pub fn matches(&self, symbol: &str) -> bool {
        match self {
            SymbolPattern::Contains(needle) => symbol.contains(needle.as_str()),
            SymbolPattern::ContainsAny(needles) => {
                needles.iter().any(|n| symbol.contains(n.as_str()))
            }
            SymbolPattern::Suffix(suffix) => symbol.ends_with(suffix.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierRule {
    pub name: String,
    pub pattern: SymbolPattern,
    pub exchange: ExchangeId,
}

impl ClassifierRule {
    pub fn new(name: impl Into<String>, pattern: SymbolPattern, exchange: ExchangeId) -> Self {
        Self {
            name: name.into(),
            pattern,
            exchange,
        }
    }
}

impl FromStr for ClassifierRule {
    type Err = anyhow::Error;

    /// Parse `<exchange>:<contains|suffix>:<text>`. Several texts separated by
    /// `|` match if any of them is contained in the symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().splitn(3, ':').collect();
        let [exchange, kind, text] = parts.as_slice() else {
            bail!("expected <exchange>:<contains|suffix>:<text>, got {:?}", s);
        };

        let exchange = match exchange.trim().to_lowercase().as_str() {
            "forex" => ExchangeId::Forex,
            "crypto" => ExchangeId::Crypto,
            other => bail!("unknown exchange {:?}", other),
        };

        let needles: Vec<String> = text
            .split('|')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if needles.is_empty() {
            bail!("rule {:?} has no match text", s);
        }

        let pattern = match (kind.trim().to_lowercase().as_str(), needles.len()) {
            ("contains", 1) => SymbolPattern::Contains(needles[0].clone()),
            ("contains", _) => SymbolPattern::ContainsAny(needles),
            ("suffix", 1) => SymbolPattern::Suffix(needles[0].clone()),
            ("suffix", _) => bail!("suffix rule {:?} takes a single text", s),
            (other, _) => bail!("unknown match kind {:?}", other),
        };

        Ok(Self::new(s.trim(), pattern, exchange))
    }
}

/// Ordered list of classification rules.
#[derive(Debug, Clone)]
pub struct SymbolClassifier {
    rules: Vec<ClassifierRule>,
}

impl Default for SymbolClassifier {
    fn default() -> Self {
        Self::empty()
            .with_rule(ClassifierRule::new(
                "underscore pair",
                SymbolPattern::Contains("_".to_string()),
                ExchangeId::Forex,
            ))
            .with_rule(ClassifierRule::new(
                "crypto quote",
                SymbolPattern::ContainsAny(vec!["USDT".to_string(), "BTC".to_string()]),
                ExchangeId::Crypto,
            ))
    }
}

impl SymbolClassifier {
    /// Classifier with no rules; every symbol is unroutable until rules are added.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule with the lowest priority.
    pub fn with_rule(mut self, rule: ClassifierRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Insert a rule ahead of all existing rules.
    pub fn with_priority_rule(mut self, rule: ClassifierRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    pub fn classify(&self, symbol: &str) -> Result<ExchangeId, RouterError> {
        let rule = self
            .rules
            .iter()
            .find(|r| r.pattern.matches(symbol))
            .ok_or_else(|| RouterError::UnroutableSymbol {
                symbol: symbol.to_string(),
            })?;

        debug!(
            symbol = %symbol,
            rule = %rule.name,
            exchange = %rule.exchange,
            "Classified symbol"
        );
        Ok(rule.exchange)
    }
}
