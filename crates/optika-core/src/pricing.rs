//! # Cart Pricing Engine
//!
//! Computes subtotal, discount, and total for a list of cart lines.
//!
//! ## The Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items ──► subtotal = Σ qty × unit_price                                │
//! │                 │                                                       │
//! │  discount ──────┤  Amount(x)   → x                                      │
//! │  (operator      │  Percent(p)  → subtotal × p (half-up)                 │
//! │   input)        │  None        → 0                                      │
//! │                 ▼                                                       │
//! │            total = max(0, subtotal - discount)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deterministic: pricing the same cart twice yields identical totals.
//! The total is never negative regardless of discount magnitude; invalid
//! or negative discount input is treated as no discount at all.

use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};
use crate::types::LineItem;

// =============================================================================
// Discount
// =============================================================================

/// How the operator expressed the cart discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Amount,
    Percent,
}

/// A parsed, well-formed discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Discount {
    #[default]
    None,
    Amount(Money),
    Percent(Rate),
}

impl Discount {
    /// Parses raw operator input into a discount.
    ///
    /// Garbage in, no-discount out: anything that does not parse to a
    /// finite non-negative number becomes `Discount::None` rather than an
    /// error - the form field simply has no effect.
    pub fn parse(kind: DiscountKind, raw: &str) -> Discount {
        let value: f64 = match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => return Discount::None,
        };

        if !value.is_finite() || value <= 0.0 {
            return Discount::None;
        }

        match kind {
            DiscountKind::Amount => Discount::Amount(Money::from_float(value)),
            DiscountKind::Percent => Discount::Percent(Rate::from_percentage(value)),
        }
    }

    /// The discount amount for a given subtotal.
    pub fn amount_for(&self, subtotal: Money) -> Money {
        match self {
            Discount::None => Money::zero(),
            Discount::Amount(amount) => *amount,
            Discount::Percent(rate) => subtotal.apply_rate(*rate),
        }
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// The priced cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Pre-discount gross.
    pub subtotal: Money,
    /// Monetary discount actually recorded (may exceed subtotal; the total
    /// clamps, the discount does not).
    pub discount: Money,
    /// `max(0, subtotal - discount)`.
    pub total: Money,
}

/// Prices a cart.
///
/// ## Example
/// ```rust
/// use optika_core::pricing::{price_cart, Discount, DiscountKind};
///
/// let totals = price_cart(&[], &Discount::parse(DiscountKind::Percent, "10"));
/// assert_eq!(totals.total.cents(), 0);
/// ```
pub fn price_cart(items: &[LineItem], discount: &Discount) -> CartTotals {
    let subtotal: Money = items.iter().map(|item| item.line_total()).sum();
    let discount_amount = discount.amount_for(subtotal);
    let total = (subtotal - discount_amount).clamp_zero();

    CartTotals {
        subtotal,
        discount: discount_amount,
        total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;

    fn line(id: &str, qty: i64, unit_price_cents: i64) -> LineItem {
        LineItem {
            id: id.to_string(),
            kind: ItemKind::Accessory,
            description: format!("Item {}", id),
            quantity: qty,
            unit_price_cents,
            cost_cents: None,
            product_id: None,
            requires_lab: false,
            lab_name: None,
            rx_notes: None,
            due_date: None,
        }
    }

    #[test]
    fn test_subtotal_accumulates_lines() {
        let items = vec![line("1", 2, 1000), line("2", 1, 500)];
        let totals = price_cart(&items, &Discount::None);
        assert_eq!(totals.subtotal.cents(), 2500);
        assert_eq!(totals.discount.cents(), 0);
        assert_eq!(totals.total.cents(), 2500);
    }

    #[test]
    fn test_percent_discount() {
        // $1000.00 cart, 10% → $100.00 off
        let items = vec![line("1", 1, 100_000)];
        let totals = price_cart(&items, &Discount::parse(DiscountKind::Percent, "10"));
        assert_eq!(totals.discount.cents(), 10_000);
        assert_eq!(totals.total.cents(), 90_000);
    }

    #[test]
    fn test_amount_discount() {
        let items = vec![line("1", 1, 5_000)];
        let totals = price_cart(&items, &Discount::parse(DiscountKind::Amount, "15.50"));
        assert_eq!(totals.discount.cents(), 1_550);
        assert_eq!(totals.total.cents(), 3_450);
    }

    /// Total never goes negative, no matter the discount.
    #[test]
    fn test_total_clamped_at_zero() {
        let items = vec![line("1", 1, 1_000)];
        let totals = price_cart(&items, &Discount::Amount(Money::from_cents(99_999)));
        assert_eq!(totals.total.cents(), 0);
        // recorded discount keeps the entered magnitude
        assert_eq!(totals.discount.cents(), 99_999);
    }

    #[test]
    fn test_invalid_discount_input_is_ignored() {
        assert_eq!(Discount::parse(DiscountKind::Amount, "abc"), Discount::None);
        assert_eq!(Discount::parse(DiscountKind::Amount, ""), Discount::None);
        assert_eq!(Discount::parse(DiscountKind::Percent, "-5"), Discount::None);
        assert_eq!(Discount::parse(DiscountKind::Percent, "NaN"), Discount::None);
    }

    /// Pricing the same cart twice yields identical results.
    #[test]
    fn test_pricing_is_deterministic() {
        let items = vec![line("1", 3, 1_234), line("2", 1, 56_789)];
        let discount = Discount::parse(DiscountKind::Percent, "12.5");
        let first = price_cart(&items, &discount);
        let second = price_cart(&items, &discount);
        assert_eq!(first, second);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // $0.33 at 50% = 16.5 cents → 17
        let items = vec![line("1", 1, 33)];
        let totals = price_cart(&items, &Discount::Percent(Rate::from_bps(5000)));
        assert_eq!(totals.discount.cents(), 17);
        assert_eq!(totals.total.cents(), 16);
    }
}
