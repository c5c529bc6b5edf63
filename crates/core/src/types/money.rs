//! Monetary amounts using decimal arithmetic.
//!
//! The marketplace trades in a single currency (INR), so an amount is a bare
//! decimal. The backend sends amounts as JSON numbers; they are parsed through
//! `rust_decimal` to avoid binary floating point drift in totals.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in rupees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from paise.
    #[must_use]
    pub fn from_paise(paise: i64) -> Self {
        Self(Decimal::new(paise, 2))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_two_places() {
        assert_eq!(Money::from_paise(123_450).to_string(), "₹1234.50");
        assert_eq!(Money::ZERO.to_string(), "₹0.00");
    }

    #[test]
    fn test_deserializes_from_json_number() {
        let money: Money = serde_json::from_str("2499.99").unwrap();
        assert_eq!(money, Money::from_paise(249_999));
        assert_eq!(serde_json::to_string(&money).unwrap(), "2499.99");
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_paise(100), Money::from_paise(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_paise(350));
    }
}
