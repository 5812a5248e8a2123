//! Defines the unit type used for monetary quantities.
use derive_more::{Add, AddAssign, Display, Neg, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};
use std::ops::{Div, Mul};

/// An amount of money.
///
/// Costs are positive; income recorded in the itemized budget is negative (see
/// [`crate::budget::BudgetRow`]).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Neg,
    Sum,
    Display,
)]
#[serde(transparent)]
pub struct Money(pub f64);

impl Money {
    /// Zero money
    pub const ZERO: Money = Money(0.0);

    /// Returns the value as a f64.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Round to the nearest penny
    pub fn round_pennies(self) -> Money {
        Money((self.0 * 100.0).round() / 100.0)
    }

    /// Whether the amount is zero
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl From<f64> for Money {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl Mul<f64> for Money {
    type Output = Money;

    fn mul(self, rhs: f64) -> Money {
        Money(self.0 * rhs)
    }
}

impl Mul<Money> for f64 {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        Money(self * rhs.0)
    }
}

impl Div<f64> for Money {
    type Output = Money;

    fn div(self, rhs: f64) -> Money {
        Money(self.0 / rhs)
    }
}

impl Div for Money {
    type Output = f64;

    fn div(self, rhs: Money) -> f64 {
        self.0 / rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_sum() {
        let total: Money = [Money(1.5), Money(2.0), Money(-0.5)].into_iter().sum();
        assert_eq!(total, Money(3.0));
    }

    #[test]
    fn test_round_pennies() {
        assert_eq!(Money(10.005_1).round_pennies(), Money(10.01));
        assert_eq!(Money(-3.333).round_pennies(), Money(-3.33));
    }
}
