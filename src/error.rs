//! Error taxonomy for routing and execution.
//!
//! Venue clients speak `anyhow`; everything that crosses the router boundary is
//! converted into a [`RouterError`] so callers can match on the kind of failure.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::ExchangeId;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouterError {
    /// No classifier rule matched the symbol.
    #[error("cannot determine exchange for symbol: {symbol}")]
    UnroutableSymbol { symbol: String },

    /// The intent failed validation before any remote call was made.
    #[error("invalid trade intent: {reason}")]
    InvalidIntent { reason: String },

    #[error("invalid reference price: {price}")]
    InvalidPrice { price: Decimal },

    /// The symbol classified to an exchange that has no adapter configured.
    #[error("{exchange} exchange is not configured")]
    ExchangeNotConfigured { exchange: ExchangeId },

    #[error("{exchange} execution failed: {cause}")]
    ExchangeExecutionFailed { exchange: ExchangeId, cause: String },

    #[error("{exchange} account query failed: {cause}")]
    AccountQueryFailed { exchange: ExchangeId, cause: String },
}

impl RouterError {
    pub fn invalid_intent(reason: impl Into<String>) -> Self {
        Self::InvalidIntent {
            reason: reason.into(),
        }
    }

    /// Wrap a venue failure, keeping the full context chain.
    pub fn execution(exchange: ExchangeId, err: &anyhow::Error) -> Self {
        Self::ExchangeExecutionFailed {
            exchange,
            cause: format!("{:#}", err),
        }
    }

    pub fn account_query(exchange: ExchangeId, err: &anyhow::Error) -> Self {
        Self::AccountQueryFailed {
            exchange,
            cause: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_execution_error_keeps_context_chain() {
        let err: anyhow::Error = Err::<(), _>(anyhow!("insufficient balance"))
            .context("Order placement failed")
            .unwrap_err();

        let wrapped = RouterError::execution(ExchangeId::Crypto, &err);
        assert_eq!(
            wrapped.to_string(),
            "crypto execution failed: Order placement failed: insufficient balance"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = RouterError::UnroutableSymbol {
            symbol: "AAPL".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "unroutable_symbol");
        assert_eq!(json["symbol"], "AAPL");
    }
}
