//! Order enums: side, type, status and time-in-force.
//!
//! Enums display as their upper-snake names. `OrderSide` and `OrderType`
//! additionally carry CamelCase names on the wire (`Buy`, `Market`, ...).

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TradingError;

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// +1 for buy, -1 for sell.
    pub fn sign(&self) -> Decimal {
        match self {
            OrderSide::Buy => Decimal::ONE,
            OrderSide::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    /// CamelCase name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        }
    }

    pub fn from_wire(value: &str) -> Result<Self, TradingError> {
        match value {
            "Buy" => Ok(OrderSide::Buy),
            "Sell" => Ok(OrderSide::Sell),
            other => Err(TradingError::Serialization(format!(
                "unknown order side '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(TradingError::InvalidArgument(format!(
                "unknown order side '{other}'"
            ))),
        }
    }
}

/// Execution behavior of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
}

impl OrderType {
    /// Passive orders rest at a price (limit and stop).
    pub fn is_passive(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::Stop)
    }

    pub fn requires_price(&self) -> bool {
        self.is_passive()
    }

    /// CamelCase name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            OrderType::Market => "Market",
            OrderType::Limit => "Limit",
            OrderType::Stop => "Stop",
        }
    }

    pub fn from_wire(value: &str) -> Result<Self, TradingError> {
        match value {
            "Market" => Ok(OrderType::Market),
            "Limit" => Ok(OrderType::Limit),
            "Stop" => Ok(OrderType::Stop),
            other => Err(TradingError::Serialization(format!(
                "unknown order type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Stop => write!(f, "STOP"),
        }
    }
}

impl FromStr for OrderType {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            "STOP" => Ok(OrderType::Stop),
            other => Err(TradingError::InvalidArgument(format!(
                "unknown order type '{other}'"
            ))),
        }
    }
}

/// How long an order remains eligible to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    Day,
    Gtc,
    Ioc,
    Foc,
    Gtd,
}

impl TimeInForce {
    pub fn requires_expire_time(&self) -> bool {
        matches!(self, TimeInForce::Gtd)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Day => write!(f, "DAY"),
            TimeInForce::Gtc => write!(f, "GTC"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Foc => write!(f, "FOC"),
            TimeInForce::Gtd => write!(f, "GTD"),
        }
    }
}

impl FromStr for TimeInForce {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAY" => Ok(TimeInForce::Day),
            "GTC" => Ok(TimeInForce::Gtc),
            "IOC" => Ok(TimeInForce::Ioc),
            "FOC" => Ok(TimeInForce::Foc),
            "GTD" => Ok(TimeInForce::Gtd),
            other => Err(TradingError::InvalidArgument(format!(
                "unknown time in force '{other}'"
            ))),
        }
    }
}

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Initialized,
    Invalid,
    Denied,
    Submitted,
    Accepted,
    Rejected,
    Working,
    Cancelled,
    Expired,
    PartiallyFilled,
    Filled,
}

impl OrderStatus {
    /// Terminal states: no event may move the order out of these.
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            OrderStatus::Invalid
                | OrderStatus::Denied
                | OrderStatus::Rejected
                | OrderStatus::Cancelled
                | OrderStatus::Expired
                | OrderStatus::Filled
        )
    }

    pub fn is_working(&self) -> bool {
        matches!(self, OrderStatus::Working)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Initialized => write!(f, "INITIALIZED"),
            OrderStatus::Invalid => write!(f, "INVALID"),
            OrderStatus::Denied => write!(f, "DENIED"),
            OrderStatus::Submitted => write!(f, "SUBMITTED"),
            OrderStatus::Accepted => write!(f, "ACCEPTED"),
            OrderStatus::Rejected => write!(f, "REJECTED"),
            OrderStatus::Working => write!(f, "WORKING"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::Expired => write!(f, "EXPIRED"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_opposite_and_sign() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
        assert_eq!(OrderSide::Buy.sign(), Decimal::ONE);
        assert_eq!(OrderSide::Sell.sign(), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn wire_names_are_camel_case() {
        assert_eq!(OrderSide::Buy.wire_name(), "Buy");
        assert_eq!(OrderType::Stop.wire_name(), "Stop");
        assert_eq!(OrderSide::from_wire("Sell").unwrap(), OrderSide::Sell);
        assert_eq!(OrderType::from_wire("Limit").unwrap(), OrderType::Limit);
        assert!(OrderSide::from_wire("SELL").is_err());
    }

    #[test]
    fn display_names_are_upper_snake() {
        assert_eq!(OrderStatus::PartiallyFilled.to_string(), "PARTIALLY_FILLED");
        assert_eq!(TimeInForce::Gtd.to_string(), "GTD");
        assert_eq!(OrderType::Market.to_string(), "MARKET");
    }

    #[test]
    fn completed_set_matches_terminal_states() {
        for status in [
            OrderStatus::Invalid,
            OrderStatus::Denied,
            OrderStatus::Rejected,
            OrderStatus::Cancelled,
            OrderStatus::Expired,
            OrderStatus::Filled,
        ] {
            assert!(status.is_completed(), "{status} should be terminal");
        }
        for status in [
            OrderStatus::Initialized,
            OrderStatus::Submitted,
            OrderStatus::Accepted,
            OrderStatus::Working,
            OrderStatus::PartiallyFilled,
        ] {
            assert!(!status.is_completed(), "{status} should not be terminal");
        }
    }

    #[test]
    fn enums_parse_from_display_form() {
        assert_eq!("BUY".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!("STOP".parse::<OrderType>().unwrap(), OrderType::Stop);
        assert_eq!("FOC".parse::<TimeInForce>().unwrap(), TimeInForce::Foc);
        assert!("GTX".parse::<TimeInForce>().is_err());
    }
}
