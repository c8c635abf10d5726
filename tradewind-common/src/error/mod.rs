//! Consolidated error handling for the trading core.
//!
//! One taxonomy covers the whole crate:
//!
//! - `InvalidArgument` — precondition violations, fail-fast, never caught
//!   internally
//! - `DuplicateKey` — database insertion of an already-present identifier
//! - `InvalidStateTrigger` — the order FSM rejected a transition; caught in
//!   the execution engine's event path, logged and dropped
//! - `NotFound` — a command-path lookup missed (reads return `Option`)
//! - `NoHandler` — a timer was registered with no handler and no default
//! - `Serialization` — a message could not be encoded/decoded; propagates
//!   to the transport boundary
//! - `Transport` — the messaging layer failed after bounded retries

use thiserror::Error;

/// Crate-wide error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("invalid state trigger: {0}")]
    InvalidStateTrigger(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no handler registered for {0}")]
    NoHandler(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("transport failed: {0}")]
    Transport(String),
}

/// Precondition check. Fails with `InvalidArgument` carrying `description`.
pub fn require(condition: bool, description: &str) -> Result<(), TradingError> {
    if condition {
        Ok(())
    } else {
        Err(TradingError::InvalidArgument(description.to_string()))
    }
}

/// Precondition check for string-valued parameters.
pub fn require_not_empty(value: &str, param: &str) -> Result<(), TradingError> {
    if value.is_empty() {
        Err(TradingError::InvalidArgument(format!(
            "the {param} cannot be an empty string"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_passes_on_true() {
        assert!(require(1 + 1 == 2, "arithmetic").is_ok());
    }

    #[test]
    fn require_fails_with_description() {
        let err = require(false, "quantity must be positive").unwrap_err();
        assert_eq!(
            err,
            TradingError::InvalidArgument("quantity must be positive".to_string())
        );
        assert!(err.to_string().contains("quantity must be positive"));
    }

    #[test]
    fn require_not_empty_rejects_empty() {
        assert!(require_not_empty("TESTER", "trader_id").is_ok());
        let err = require_not_empty("", "trader_id").unwrap_err();
        assert!(err.to_string().contains("trader_id"));
    }
}
