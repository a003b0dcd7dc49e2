//! # Bank-Commission Expenses
//!
//! Derives the expense records for what the bank charges the business on
//! card payments. Each card payment routed through a terminal yields one
//! expense at checkout, so the day's ledger shows commissions next to the
//! sales that caused them.
//!
//! NOTE: the rate here is ADDITIVE for installment plans (base fee PLUS the
//! installment bucket), while the customer-side fee in [`crate::fees`]
//! REPLACES the base with the bucket. The two sides have always disagreed
//! and reports are reconciled against this behavior, so both are kept
//! exactly as they are. See `resolve_fee_bps` for the other half.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::money::Rate;
use crate::types::{
    ExpenseCategory, ExpenseDraft, PaymentDraft, PaymentMethod, Terminal,
};

/// Sale-level context for the expense descriptions.
#[derive(Debug, Clone)]
pub struct CommissionContext<'a> {
    pub sale_id: &'a str,
    pub folio: &'a str,
    pub branch_id: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Bank-side commission rate for one payment.
///
/// Base terminal fee, plus the installment bucket when the plan runs over
/// more than one month. A missing bucket contributes nothing extra.
fn commission_rate(terminal: &Terminal, installments: u32) -> Rate {
    let base = terminal.base_fee();
    if installments <= 1 {
        return base;
    }
    match terminal.installment_rate(installments) {
        Some(bucket) => base.plus(bucket),
        None => base,
    }
}

/// Derives one bank-commission expense per card payment with a terminal.
///
/// Non-card payments, payments with no terminal, unknown terminals and
/// zero-rate or zero-amount results are all skipped rather than recorded
/// as empty expenses.
pub fn prepare_commission_expenses(
    payments: &[PaymentDraft],
    terminals: &HashMap<String, Terminal>,
    ctx: &CommissionContext<'_>,
) -> Vec<ExpenseDraft> {
    let mut expenses = Vec::new();

    for payment in payments {
        if payment.method != PaymentMethod::Card {
            continue;
        }
        let Some(terminal_id) = payment.terminal_id.as_deref() else {
            continue;
        };
        let Some(terminal) = terminals.get(terminal_id) else {
            continue;
        };

        let rate = commission_rate(terminal, payment.installments);
        let amount = payment.amount().apply_rate(rate);
        if !amount.is_positive() {
            continue;
        }

        let plan = if payment.installments > 1 {
            format!(", {} installments", payment.installments)
        } else {
            String::new()
        };

        expenses.push(ExpenseDraft {
            branch_id: ctx.branch_id.to_string(),
            category: ExpenseCategory::BankCommission,
            amount_cents: amount.cents(),
            description: format!(
                "Bank commission {} ({:.2}%{}) - sale {}",
                terminal.name,
                rate.percentage(),
                plan,
                ctx.folio
            ),
            sale_id: Some(ctx.sale_id.to_string()),
            method: PaymentMethod::Other,
            incurred_at: ctx.created_at,
        });
    }

    expenses
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::CardType;

    fn terminal() -> Terminal {
        Terminal {
            id: "term-1".to_string(),
            name: "BBVA".to_string(),
            fee_bps: 350,
            installment_rates: [(3, 300), (6, 450)].into_iter().collect(),
        }
    }

    fn terminals() -> HashMap<String, Terminal> {
        let t = terminal();
        HashMap::from([(t.id.clone(), t)])
    }

    fn card(cents: i64, installments: u32) -> PaymentDraft {
        PaymentDraft {
            method: PaymentMethod::Card,
            amount_cents: cents,
            terminal_id: Some("term-1".to_string()),
            card_type: Some(CardType::Credit),
            installments,
            fee_cents: 0,
        }
    }

    fn ctx() -> CommissionContext<'static> {
        CommissionContext {
            sale_id: "sale-1",
            folio: "V-20250115-0001",
            branch_id: "branch-1",
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_single_payment_base_rate() {
        let expenses = prepare_commission_expenses(&[card(100_000, 1)], &terminals(), &ctx());
        assert_eq!(expenses.len(), 1);
        // $1000 at 3.5%
        assert_eq!(expenses[0].amount_cents, 3_500);
        assert_eq!(expenses[0].category, ExpenseCategory::BankCommission);
        assert!(expenses[0].description.contains("BBVA"));
        assert!(expenses[0].description.contains("V-20250115-0001"));
        assert_eq!(expenses[0].sale_id.as_deref(), Some("sale-1"));
    }

    /// Installments stack the bucket ON TOP of the base rate here, unlike
    /// the customer-side fee where the bucket replaces it.
    #[test]
    fn test_installments_add_bucket_to_base() {
        let expenses = prepare_commission_expenses(&[card(100_000, 6)], &terminals(), &ctx());
        // 3.5% + 4.5% = 8%, not 4.5%
        assert_eq!(expenses[0].amount_cents, 8_000);
        assert!(expenses[0].description.contains("6 installments"));

        // and the customer side really does resolve 4.5% for the same input
        let customer = crate::fees::resolve_fee_bps(Some("term-1"), 6, &terminals());
        assert_eq!(customer.bps(), 450);
    }

    #[test]
    fn test_missing_bucket_falls_back_to_base() {
        let expenses = prepare_commission_expenses(&[card(100_000, 9)], &terminals(), &ctx());
        assert_eq!(expenses[0].amount_cents, 3_500);
    }

    #[test]
    fn test_skips_non_commission_payments() {
        let cash = PaymentDraft::simple(PaymentMethod::Cash, Money::from_cents(100_000));
        let mut no_terminal = card(100_000, 1);
        no_terminal.terminal_id = None;
        let mut unknown = card(100_000, 1);
        unknown.terminal_id = Some("nope".to_string());
        let zero = card(0, 1);

        let expenses = prepare_commission_expenses(
            &[cash, no_terminal, unknown, zero],
            &terminals(),
            &ctx(),
        );
        assert!(expenses.is_empty());
    }

    #[test]
    fn test_one_expense_per_card_payment() {
        let expenses = prepare_commission_expenses(
            &[card(50_000, 1), card(50_000, 3)],
            &terminals(),
            &ctx(),
        );
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].amount_cents, 1_750); // 3.5%
        assert_eq!(expenses[1].amount_cents, 3_250); // 3.5% + 3%
    }
}
