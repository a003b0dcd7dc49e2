//! # Terminal Fee Resolution
//!
//! Resolves the card-terminal fee percentage for a payment, given the
//! terminal configuration and the chosen installment plan.
//!
//! ## Resolution Rule (REPLACEMENT semantics)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_fee_bps(terminal, installments)                                │
//! │                                                                         │
//! │  terminal unknown        → 0                                            │
//! │  installments <= 1       → base fee                                     │
//! │  bucket configured       → bucket rate   (REPLACES the base fee)        │
//! │  bucket missing          → base fee      (documented fallback)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! NOTE: the bank-commission expense preparer ([`crate::commission`]) uses
//! a different, ADDITIVE rule (base + bucket). Both behaviors are carried
//! over from the system being replaced; see DESIGN.md before "fixing"
//! either one.

use std::collections::HashMap;

use crate::money::{Money, Rate};
use crate::types::Terminal;

/// Resolves the fee rate for a payment on the given terminal.
///
/// Pure and total: no terminal, or an unknown one, resolves to a zero
/// rate rather than an error, so payment entry never blocks on stale
/// terminal config (and non-card tenders simply carry no terminal).
pub fn resolve_fee_bps(
    terminal_id: Option<&str>,
    installments: u32,
    terminals: &HashMap<String, Terminal>,
) -> Rate {
    let Some(terminal) = terminal_id.and_then(|id| terminals.get(id)) else {
        return Rate::zero();
    };

    if installments <= 1 {
        return terminal.base_fee();
    }

    terminal
        .installment_rate(installments)
        .unwrap_or_else(|| terminal.base_fee())
}

/// The monetary fee for an amount at a resolved rate, rounded half-up.
#[inline]
pub fn fee_amount(amount: Money, rate: Rate) -> Money {
    amount.apply_rate(rate)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn terminals() -> HashMap<String, Terminal> {
        let terminal = Terminal {
            id: "term-1".to_string(),
            name: "BBVA".to_string(),
            fee_bps: 350, // 3.5%
            installment_rates: BTreeMap::from([(3, 400), (6, 450), (12, 600)]),
        };
        HashMap::from([(terminal.id.clone(), terminal)])
    }

    #[test]
    fn test_single_payment_uses_base_fee() {
        assert_eq!(resolve_fee_bps(Some("term-1"), 1, &terminals()).bps(), 350);
    }

    /// The installment bucket replaces the base fee; it is not added to it.
    #[test]
    fn test_installment_bucket_replaces_base() {
        assert_eq!(resolve_fee_bps(Some("term-1"), 6, &terminals()).bps(), 450);
    }

    #[test]
    fn test_missing_bucket_falls_back_to_base() {
        // 9 months is not configured on this terminal
        assert_eq!(resolve_fee_bps(Some("term-1"), 9, &terminals()).bps(), 350);
    }

    #[test]
    fn test_unknown_terminal_resolves_to_zero() {
        assert_eq!(resolve_fee_bps(Some("term-9"), 6, &terminals()).bps(), 0);
        assert!(resolve_fee_bps(None, 1, &terminals()).is_zero());
    }

    #[test]
    fn test_fee_amount() {
        // $1000.00 at 4.5% = $45.00
        let fee = fee_amount(Money::from_cents(100_000), Rate::from_bps(450));
        assert_eq!(fee.cents(), 4_500);
    }
}
