//! Bracket orders: an entry order plus OCO children.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::order::Order;
use super::types::{OrderSide, OrderType};
use crate::error::{require, TradingError};
use crate::identifiers::OrderId;

/// An entry order bracketed by a stop-loss and an optional take-profit.
///
/// The children are one-cancels-other: when one fills or cancels on the
/// venue, the sibling is cancelled. The bracket id is `"B" + entry.id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketOrder {
    id: OrderId,
    entry: Order,
    stop_loss: Order,
    take_profit: Option<Order>,
}

impl BracketOrder {
    pub fn new(
        entry: Order,
        stop_loss: Order,
        take_profit: Option<Order>,
    ) -> Result<Self, TradingError> {
        require(
            stop_loss.order_type() == OrderType::Stop,
            "the stop-loss must be a STOP order",
        )?;
        require(
            stop_loss.side() == entry.side().opposite(),
            "the stop-loss must oppose the entry side",
        )?;
        if let Some(tp) = &take_profit {
            require(
                tp.order_type() == OrderType::Limit,
                "the take-profit must be a LIMIT order",
            )?;
            require(
                tp.side() == entry.side().opposite(),
                "the take-profit must oppose the entry side",
            )?;
            require(
                tp.symbol() == entry.symbol(),
                "the take-profit symbol must match the entry",
            )?;
        }
        require(
            stop_loss.symbol() == entry.symbol(),
            "the stop-loss symbol must match the entry",
        )?;

        let id = OrderId::from(format!("B{}", entry.id()));
        Ok(Self {
            id,
            entry,
            stop_loss,
            take_profit,
        })
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn entry(&self) -> &Order {
        &self.entry
    }

    pub fn stop_loss(&self) -> &Order {
        &self.stop_loss
    }

    pub fn take_profit(&self) -> Option<&Order> {
        self.take_profit.as_ref()
    }

    pub fn has_take_profit(&self) -> bool {
        self.take_profit.is_some()
    }

    /// The component orders in submission order: entry, stop-loss, then the
    /// take-profit when present.
    pub fn orders(&self) -> Vec<&Order> {
        let mut orders = vec![&self.entry, &self.stop_loss];
        if let Some(take_profit) = &self.take_profit {
            orders.push(take_profit);
        }
        orders
    }

    /// The entry side, for convenience.
    pub fn side(&self) -> OrderSide {
        self.entry.side()
    }
}

impl fmt::Display for BracketOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BracketOrder({} entry={} sl={} tp={})",
            self.id,
            self.entry.id(),
            self.stop_loss.id(),
            self.take_profit
                .as_ref()
                .map(|o| o.id().to_string())
                .unwrap_or_else(|| "NONE".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::Symbol;
    use crate::orders::TimeInForce;
    use crate::types::{Price, Quantity};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn order(id: &str, side: OrderSide, order_type: OrderType, price: Option<&str>) -> Order {
        Order::new(
            OrderId::from(id),
            Symbol::new("AUDUSD", "FXCM").unwrap(),
            side,
            order_type,
            Quantity::from_units(10),
            match order_type {
                OrderType::Market => TimeInForce::Day,
                _ => TimeInForce::Gtc,
            },
            price.map(|p| Price::parse(p).unwrap()),
            None,
            Uuid::from_u128(1),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn bracket_id_prefixes_entry_id() {
        let bracket = BracketOrder::new(
            order("O-1", OrderSide::Buy, OrderType::Market, None),
            order("O-2", OrderSide::Sell, OrderType::Stop, Some("0.99000")),
            Some(order("O-3", OrderSide::Sell, OrderType::Limit, Some("1.05000"))),
        )
        .unwrap();
        assert_eq!(bracket.id().as_str(), "BO-1");
        assert!(bracket.has_take_profit());
        assert_eq!(bracket.side(), OrderSide::Buy);
    }

    #[test]
    fn stop_loss_must_be_a_stop() {
        let result = BracketOrder::new(
            order("O-1", OrderSide::Buy, OrderType::Market, None),
            order("O-2", OrderSide::Sell, OrderType::Limit, Some("0.99000")),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn children_must_oppose_entry() {
        let result = BracketOrder::new(
            order("O-1", OrderSide::Buy, OrderType::Market, None),
            order("O-2", OrderSide::Buy, OrderType::Stop, Some("0.99000")),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn take_profit_is_optional() {
        let bracket = BracketOrder::new(
            order("O-1", OrderSide::Sell, OrderType::Market, None),
            order("O-2", OrderSide::Buy, OrderType::Stop, Some("1.05000")),
            None,
        )
        .unwrap();
        assert!(!bracket.has_take_profit());
    }
}
