//! Decimal money arithmetic and the rounding policy.
//!
//! Monetary amounts are held at scale 2 and rates at scale 4. Both are
//! normalised with half-up rounding when constructed, and every derived
//! amount is rounded again as soon as it is computed.

use std::iter::Sum;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places kept for rates and percentages.
pub const RATE_SCALE: u32 = 4;

/// Rounds half-up to `scale` places and pins the scale, so `5` becomes `5.00`.
fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// Rounds half-up to 2 decimal places.
pub fn round2(value: Decimal) -> Decimal {
    round_half_up(value, MONEY_SCALE)
}

/// Rounds half-up to 4 decimal places.
pub fn round4(value: Decimal) -> Decimal {
    round_half_up(value, RATE_SCALE)
}

/// A monetary amount at scale 2.
///
/// There is no currency; the core is single-currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates an amount, rounding half-up to 2 decimal places.
    pub fn new(amount: Decimal) -> Self {
        Self(round2(amount))
    }

    /// Creates an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::new(0, MONEY_SCALE))
    }

    /// Returns the decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies by a quantity and rounds.
    pub fn times(&self, quantity: u32) -> Money {
        Money::new(self.0 * Decimal::from(quantity))
    }

    /// Multiplies by a rate and rounds.
    pub fn apply_rate(&self, rate: Rate) -> Money {
        Money::new(self.0 * rate.value())
    }

    /// Adds, returning None if the result is not representable.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money::new)
    }

    /// Subtracts, returning None if the result is not representable.
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money::new)
    }

    /// Like [`times`](Self::times), returning None on overflow.
    pub fn checked_times(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money::new)
    }

    /// Like [`apply_rate`](Self::apply_rate), returning None on overflow.
    pub fn checked_apply_rate(&self, rate: Rate) -> Option<Money> {
        self.0.checked_mul(rate.value()).map(Money::new)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// A rate or percentage expressed as a fraction (0.08 = 8%), at scale 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    /// Creates a rate, rounding half-up to 4 decimal places.
    pub fn new(value: Decimal) -> Self {
        Self(round4(value))
    }

    /// Returns the zero rate.
    pub fn zero() -> Self {
        Self(Decimal::new(0, RATE_SCALE))
    }

    /// Returns the decimal fraction.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
