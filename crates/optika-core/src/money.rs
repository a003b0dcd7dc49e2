//! # Money Module
//!
//! Monetary values as integer cents, percentages as basis points.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The system this engine replaces kept money in floats and had to pipe   │
//! │  every result through a rounding helper to stop drift:                  │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every stored or persisted amount is an i64 cent count. Floats only   │
//! │    exist at the input boundary (Money::from_float), where they are      │
//! │    rounded half-up to two decimals exactly once.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Rules
//! - Percentage application (`apply_rate`, `prorate`): half-up.
//! - Loyalty points (`points_at`): floor. Fractional points are truncated,
//!   never rounded up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000. 350 bps = 3.50% (a typical card fee).
///
/// One representation covers every percentage in the system: discount
/// percents, terminal fees, installment surcharges, loyalty earning rates,
/// and referral bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience at input edges).
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct < 0.0 {
            return Rate(0);
        }
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two rates, saturating.
    ///
    /// Used by the commission preparer, whose expense rate is the terminal
    /// base fee plus the installment surcharge.
    #[inline]
    pub const fn plus(&self, other: Rate) -> Rate {
        Rate(self.0.saturating_add(other.0))
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values exist transiently (e.g. stock-log
///   quantities are modelled separately, but subtraction must not trap)
/// - **Single-field tuple struct**: zero-cost abstraction over i64
///
/// Every monetary amount computed by the calculators flows through this
/// type; structs persist plain `*_cents: i64` fields and expose `Money`
/// accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Coerces a float amount (currency units) to Money.
    ///
    /// This is the ONE place float money is allowed: operator-typed values
    /// such as a discount amount arrive as floats/strings and are rounded
    /// half-up at two decimals here. Non-finite input coerces to zero.
    pub fn from_float(value: f64) -> Self {
        if !value.is_finite() {
            return Money(0);
        }
        Money((value * 100.0).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major-unit portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor-unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative amounts to zero.
    ///
    /// Totals are never negative regardless of discount magnitude.
    #[inline]
    pub const fn clamp_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Applies a rate and returns the resulting amount, rounded half-up.
    ///
    /// ## Implementation
    /// Integer math in i128 to prevent overflow:
    /// `(cents * bps + 5000) / 10000`, where the +5000 provides the half-up.
    ///
    /// ## Example
    /// ```rust
    /// use optika_core::money::{Money, Rate};
    ///
    /// let amount = Money::from_cents(10_000);        // $100.00
    /// let fee = amount.apply_rate(Rate::from_bps(350)); // 3.5%
    /// assert_eq!(fee.cents(), 350);                  // $3.50
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(cents as i64)
    }

    /// Computes loyalty points earned on this amount at the given rate.
    ///
    /// Points are whole units and ALWAYS floored: $150.00 at 1% is 1 point,
    /// not 2. Rounding up here would overpay rewards over time.
    pub fn points_at(&self, rate: Rate) -> i64 {
        if self.0 <= 0 || rate.is_zero() {
            return 0;
        }
        // cents * bps / 10000 = fractional cents earned; / 100 more = points
        (self.0 as i128 * rate.bps() as i128 / 1_000_000) as i64
    }

    /// Returns this amount's proportional share `part / whole`, half-up.
    ///
    /// Used to split a whole-cart discount across the counter and lab
    /// halves of a split sale. `whole` must be positive; the caller assigns
    /// the remainder (`self - share`) to the other half so the shares
    /// reconcile to the cent.
    pub fn prorate(&self, part: Money, whole: Money) -> Money {
        if whole.0 <= 0 {
            return Money(0);
        }
        let share = (self.0 as i128 * part.0 as i128 + whole.0 as i128 / 2) / whole.0 as i128;
        Money(share as i64)
    }

    /// Multiplies by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. UI formatting/localization happens elsewhere.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_float_boundary() {
        assert_eq!(Money::from_float(10.99).cents(), 1099);
        assert_eq!(Money::from_float(10.995).cents(), 1100); // half-up
        assert_eq!(Money::from_float(0.0).cents(), 0);
        assert_eq!(Money::from_float(f64::NAN).cents(), 0);
        assert_eq!(Money::from_float(f64::INFINITY).cents(), 0);
    }

    /// Re-rounding an already-rounded value must be the identity.
    #[test]
    fn test_rounding_stability() {
        for raw in [0.1, 12.345, 99.999, 0.005, 1234.5678] {
            let once = Money::from_float(raw);
            let twice = Money::from_float(once.cents() as f64 / 100.0);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(vec![a, b].into_iter().sum::<Money>().cents(), 1500);
    }

    #[test]
    fn test_apply_rate_half_up() {
        // $10.00 at 8.25% = $0.825 → $0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.apply_rate(Rate::from_bps(825)).cents(), 83);
        // $100.00 at 3.5% = $3.50 exactly
        assert_eq!(Money::from_cents(10_000).apply_rate(Rate::from_bps(350)).cents(), 350);
    }

    #[test]
    fn test_points_floor() {
        // $150.00 at 1% = 1.5 points → 1
        assert_eq!(Money::from_cents(15_000).points_at(Rate::from_bps(100)), 1);
        // $99.00 at 1% = 0.99 points → 0
        assert_eq!(Money::from_cents(9_900).points_at(Rate::from_bps(100)), 0);
        assert_eq!(Money::from_cents(-500).points_at(Rate::from_bps(100)), 0);
    }

    #[test]
    fn test_prorate() {
        // $100 discount split over $200 of a $1000 cart = $20
        let discount = Money::from_cents(10_000);
        let share = discount.prorate(Money::from_cents(20_000), Money::from_cents(100_000));
        assert_eq!(share.cents(), 2_000);
        // Remainder-by-subtraction reconciles exactly
        assert_eq!((discount - share).cents(), 8_000);
        // Zero whole yields zero share
        assert_eq!(discount.prorate(Money::zero(), Money::zero()).cents(), 0);
    }

    #[test]
    fn test_clamp_zero() {
        assert_eq!(Money::from_cents(-500).clamp_zero().cents(), 0);
        assert_eq!(Money::from_cents(500).clamp_zero().cents(), 500);
    }

    #[test]
    fn test_rate_constructors() {
        assert_eq!(Rate::from_percentage(3.5).bps(), 350);
        assert_eq!(Rate::from_percentage(-1.0).bps(), 0);
        assert_eq!(Rate::from_percentage(f64::NAN).bps(), 0);
        assert_eq!(Rate::from_bps(450).plus(Rate::from_bps(350)).bps(), 800);
    }
}
