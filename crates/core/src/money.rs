use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// A monetary value with two fractional digits.
///
/// Amounts on stored records are always non-negative; income vs expense is a
/// flag on the record, never a sign here. Signed values still occur
/// transiently during import, before the sign is folded into the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn to_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Percentage this value represents of `total`, as in `spent.percent_of(limit)`.
    /// A zero or negative `total` reports 0 rather than dividing by zero.
    pub fn percent_of(self, total: Money) -> f64 {
        if total.0 <= Decimal::ZERO {
            return 0.0;
        }
        (self.0 / total.0 * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0)
    }

    /// Evenly spread this value over `days`, rounded to cents.
    /// Zero or negative day counts yield zero.
    pub fn per_day(self, days: i64) -> Money {
        if days <= 0 {
            return Money::zero();
        }
        Money((self.0 / Decimal::from(days)).round_dp(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

/// Scaling by a decimal factor, used by budget buffer multipliers and
/// allocation shares. The product is re-rounded to cents.
impl Mul<Decimal> for Money {
    type Output = Self;
    fn mul(self, rhs: Decimal) -> Self {
        Money((self.0 * rhs).round_dp(2))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn cents_round_trip() {
        assert_eq!(Money::from_cents(12345).to_cents(), 12345);
        assert_eq!(Money::from_cents(-500).to_cents(), -500);
    }

    #[test]
    fn from_decimal_rounds_to_cents() {
        let m = Money::from_decimal(Decimal::from_str("10.005").unwrap());
        assert_eq!(m.to_cents(), 1000); // banker's rounding
        let m = Money::from_decimal(Decimal::from_str("10.015").unwrap());
        assert_eq!(m.to_cents(), 1002);
    }

    #[test]
    fn display_two_digits() {
        assert_eq!(Money::from_cents(4999).to_string(), "$49.99");
        assert_eq!(Money::from_cents(100).to_string(), "$1.00");
    }

    #[test]
    fn percent_of_basic() {
        let spent = Money::from_cents(10_000);
        let limit = Money::from_cents(50_000);
        assert_eq!(spent.percent_of(limit), 20.0);
    }

    #[test]
    fn percent_of_over_limit() {
        let spent = Money::from_cents(15_000);
        let limit = Money::from_cents(10_000);
        assert_eq!(spent.percent_of(limit), 150.0);
    }

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(Money::from_cents(100).percent_of(Money::zero()), 0.0);
    }

    #[test]
    fn per_day_spreads_evenly() {
        assert_eq!(Money::from_cents(3000).per_day(30).to_cents(), 100);
        assert_eq!(Money::from_cents(1000).per_day(3).to_cents(), 333);
    }

    #[test]
    fn per_day_zero_days_is_zero() {
        assert_eq!(Money::from_cents(1000).per_day(0), Money::zero());
        assert_eq!(Money::from_cents(1000).per_day(-5), Money::zero());
    }

    #[test]
    fn mul_decimal_applies_buffer() {
        let avg = Money::from_cents(10_000);
        let buffered = avg * Decimal::from_str("1.2").unwrap();
        assert_eq!(buffered.to_cents(), 12_000);
    }

    #[test]
    fn sum_of_money() {
        let total: Money = [100, 250, 399].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.to_cents(), 749);
    }
}
