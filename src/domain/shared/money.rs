use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A non-negative monetary amount with two decimal places.
///
/// Signed amounts only exist on ledger entries; everything an aggregate
/// stores (fees, deductions, balances) goes through this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MoneyError {
    #[error("Amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("Amount is out of range")]
    Overflow,
}

impl Money {
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Whole currency units, e.g. `from_major(150)` is 150.00
    pub fn from_major(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    /// Minor units (piasters / cents), e.g. `from_minor(1999)` is 19.99
    pub fn from_minor(minor: u64) -> Self {
        Self(Decimal::from(minor) / Decimal::ONE_HUNDRED)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero()
    }

    /// `None` when the result would be negative
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        let result = self.0 - other.0;
        if result.is_sign_negative() && !result.is_zero() {
            None
        } else {
            Some(Money(result))
        }
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        self.checked_sub(other).unwrap_or_default()
    }

    /// `None` when the sum does not fit a decimal
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiply by a non-negative factor and round back to 2 dp
    pub fn times(self, factor: Decimal) -> Result<Money, MoneyError> {
        let product = self.0.checked_mul(factor).ok_or(MoneyError::Overflow)?;
        Money::new(product)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amount_rejected() {
        assert!(matches!(Money::new(Decimal::new(-1, 2)), Err(MoneyError::Negative(_))));
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let money = Money::new(Decimal::new(10005, 3)).unwrap(); // 10.005
        assert_eq!(money, Money::from_minor(1001));
        assert_eq!(money.to_string(), "10.01");
    }

    #[test]
    fn test_checked_sub_never_goes_negative() {
        let ten = Money::from_major(10);
        let four = Money::from_major(4);
        assert_eq!(ten.checked_sub(four), Some(Money::from_major(6)));
        assert_eq!(four.checked_sub(ten), None);
        assert_eq!(four.saturating_sub(ten), Money::zero());
    }

    #[test]
    fn test_sum_and_times() {
        let total: Money = vec![Money::from_minor(150), Money::from_minor(250)].into_iter().sum();
        assert_eq!(total, Money::from_major(4));
        assert_eq!(total.times(Decimal::from(3)).unwrap(), Money::from_major(12));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = Money::new(Decimal::MAX).unwrap();
        assert_eq!(huge.times(Decimal::from(2)), Err(MoneyError::Overflow));
        assert_eq!(huge.checked_add(Money::from_major(1)), None);
        assert_eq!(Money::from_major(1).checked_add(Money::from_major(2)), Some(Money::from_major(3)));
    }

    #[test]
    fn test_deserializing_negative_fails() {
        let result: Result<Money, _> = serde_json::from_str("\"-5.00\"");
        assert!(result.is_err());

        let money: Money = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(money, Money::from_minor(1250));
    }
}
