//! Typed identifiers for the trading domain.
//!
//! Every identifier is a non-empty string newtype: value-compared, hashable,
//! ordered, and `Display`ed as the inner string. The insertion-time string is
//! preserved so identifiers round-trip through serialization unchanged.
//!
//! `new` validates non-emptiness and fails with `InvalidArgument`; the `From`
//! conversions are unchecked and intended for literals and already-validated
//! input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{require_not_empty, TradingError};

mod generator;
mod uuids;

pub use generator::{IdentifierGenerator, OrderIdGenerator, PositionIdGenerator};
pub use uuids::UuidFactory;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, validating non-emptiness.
            pub fn new(value: impl Into<String>) -> Result<Self, TradingError> {
                let value = value.into();
                require_not_empty(&value, $param)?;
                Ok(Self(value))
            }

            /// The inner string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

identifier!(
    /// Identifier for a trader (one running platform instance).
    TraderId,
    "trader_id"
);
identifier!(
    /// Identifier for a trading strategy.
    StrategyId,
    "strategy_id"
);
identifier!(
    /// Identifier for a brokerage account.
    AccountId,
    "account_id"
);
identifier!(
    /// Client-assigned order identifier.
    OrderId,
    "order_id"
);
identifier!(
    /// Broker-assigned order identifier, set once the venue acknowledges.
    OrderIdBroker,
    "order_id_broker"
);
identifier!(
    /// Logical position identifier, assigned at order submission.
    PositionId,
    "position_id"
);
identifier!(
    /// Broker-assigned position identifier carried on fill events.
    PositionIdBroker,
    "position_id_broker"
);
identifier!(
    /// Identifier for a single execution (fill).
    ExecutionId,
    "execution_id"
);
identifier!(
    /// Identifier for a messaging client.
    ClientId,
    "client_id"
);
identifier!(
    /// Identifier for a messaging server.
    ServerId,
    "server_id"
);
identifier!(
    /// Identifier for a messaging session.
    SessionId,
    "session_id"
);

/// A tradable instrument: `code.venue` (e.g. `AUDUSD.FXCM`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol {
    code: String,
    venue: String,
}

impl Symbol {
    /// Create a new symbol from an instrument code and venue name.
    pub fn new(code: impl Into<String>, venue: impl Into<String>) -> Result<Self, TradingError> {
        let code = code.into();
        let venue = venue.into();
        require_not_empty(&code, "symbol code")?;
        require_not_empty(&venue, "symbol venue")?;
        Ok(Self {
            code: code.to_uppercase(),
            venue: venue.to_uppercase(),
        })
    }

    /// Parse from the canonical `CODE.VENUE` form.
    pub fn parse(value: &str) -> Result<Self, TradingError> {
        match value.split_once('.') {
            Some((code, venue)) => Self::new(code, venue),
            None => Err(TradingError::InvalidArgument(format!(
                "symbol '{value}' is not in CODE.VENUE form"
            ))),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.code, self.venue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identifiers_are_value_compared() {
        assert_eq!(OrderId::from("O-1"), OrderId::from("O-1"));
        assert_ne!(OrderId::from("O-1"), OrderId::from("O-2"));
        assert!(OrderId::from("O-1") < OrderId::from("O-2"));
    }

    #[test]
    fn identifiers_are_hashable() {
        let mut set = HashSet::new();
        set.insert(PositionId::from("P-1"));
        set.insert(PositionId::from("P-1"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_identifier_is_rejected() {
        let err = TraderId::new("").unwrap_err();
        assert!(matches!(err, TradingError::InvalidArgument(_)));
    }

    #[test]
    fn identifier_display_round_trips() {
        let id = AccountId::new("FXCM-02851908").unwrap();
        assert_eq!(id.to_string(), "FXCM-02851908");
        assert_eq!(AccountId::from(id.to_string()), id);
    }

    #[test]
    fn symbol_parse_round_trips() {
        let symbol = Symbol::parse("AUDUSD.FXCM").unwrap();
        assert_eq!(symbol.code(), "AUDUSD");
        assert_eq!(symbol.venue(), "FXCM");
        assert_eq!(symbol.to_string(), "AUDUSD.FXCM");
        assert_eq!(Symbol::parse(&symbol.to_string()).unwrap(), symbol);
    }

    #[test]
    fn symbol_is_uppercased() {
        let symbol = Symbol::new("audusd", "fxcm").unwrap();
        assert_eq!(symbol.to_string(), "AUDUSD.FXCM");
    }

    #[test]
    fn symbol_without_venue_is_rejected() {
        assert!(Symbol::parse("AUDUSD").is_err());
    }
}
