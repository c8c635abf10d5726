//! Currency-tagged monetary amounts.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::TradingError;

/// ISO-4217 currency subset used by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Aud,
    Nzd,
    Cad,
    Chf,
}

impl Currency {
    /// Fractional digits conventionally quoted for the currency.
    pub fn precision(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Aud => "AUD",
            Currency::Nzd => "NZD",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
        }
    }
}

impl FromStr for Currency {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            "AUD" => Ok(Currency::Aud),
            "NZD" => Ok(Currency::Nzd),
            "CAD" => Ok(Currency::Cad),
            "CHF" => Ok(Currency::Chf),
            other => Err(TradingError::InvalidArgument(format!(
                "unknown currency '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A monetary amount in a single currency, held at currency precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Create a new amount, rounding to the currency precision with banker's
    /// rounding.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp_with_strategy(
                currency.precision(),
                RoundingStrategy::MidpointNearestEven,
            ),
            currency,
        }
    }

    /// Parse an amount from its string form.
    pub fn from_string(value: &str, currency: Currency) -> Result<Self, TradingError> {
        let amount = Decimal::from_str(value).map_err(|e| {
            TradingError::InvalidArgument(format!("cannot parse money '{value}': {e}"))
        })?;
        Ok(Self::new(amount, currency))
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    fn check_currency(&self, other: &Self, op: &str) -> Result<(), TradingError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(TradingError::InvalidArgument(format!(
                "cannot {op} {} and {}",
                self.currency, other.currency
            )))
        }
    }

    /// Add another amount of the same currency.
    pub fn add(&self, other: &Self) -> Result<Self, TradingError> {
        self.check_currency(other, "add")?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Subtract another amount of the same currency.
    pub fn sub(&self, other: &Self) -> Result<Self, TradingError> {
        self.check_currency(other, "subtract")?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*} {}",
            self.currency.precision() as usize,
            self.amount,
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_string_parses_at_currency_precision() {
        let money = Money::from_string("1234.56", Currency::Usd).unwrap();
        assert_eq!(money.amount(), dec!(1234.56));
        assert_eq!(money.currency(), Currency::Usd);
    }

    #[test]
    fn jpy_has_zero_precision() {
        let money = Money::new(dec!(1000.4), Currency::Jpy);
        assert_eq!(money.amount(), dec!(1000));
        assert_eq!(money.to_string(), "1000 JPY");
    }

    #[test]
    fn arithmetic_requires_matching_currency() {
        let usd = Money::new(dec!(100), Currency::Usd);
        let aud = Money::new(dec!(100), Currency::Aud);
        assert!(usd.add(&aud).is_err());
        assert_eq!(
            usd.add(&Money::new(dec!(25.50), Currency::Usd)).unwrap(),
            Money::new(dec!(125.50), Currency::Usd)
        );
        assert_eq!(
            usd.sub(&Money::new(dec!(0.01), Currency::Usd)).unwrap(),
            Money::new(dec!(99.99), Currency::Usd)
        );
    }

    #[test]
    fn construction_rounds_to_currency_precision() {
        // 0.125 rounds to 0.12 under banker's rounding.
        assert_eq!(
            Money::new(dec!(0.125), Currency::Usd).amount(),
            dec!(0.12)
        );
    }

    #[test]
    fn currency_round_trips_through_string() {
        for currency in [
            Currency::Usd,
            Currency::Eur,
            Currency::Gbp,
            Currency::Jpy,
            Currency::Aud,
            Currency::Nzd,
            Currency::Cad,
            Currency::Chf,
        ] {
            assert_eq!(currency.as_str().parse::<Currency>().unwrap(), currency);
        }
    }
}
