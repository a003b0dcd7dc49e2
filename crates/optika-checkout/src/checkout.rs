//! # Checkout Orchestrator
//!
//! Turns a session snapshot into committed rows. All the math is done by
//! optika-core preparers; all the SQL by optika-db's checkout transaction.
//! This module only sequences them.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Flow                                    │
//! │                                                                         │
//! │  snapshot session ──► empty? ──► EmptyCart                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  claim in-flight flag ──► taken? ──► Busy                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mixed cart? ──► prompt cashier ──► declined? ──► Cancelled            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  build ticket groups (1, or 2 for a split)                             │
//! │  prefetch products / terminals / loyalty settings                      │
//! │  reserve stock against the prefetched map  ◄── fails BEFORE any write  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ONE transaction: sales, items, payments, stock, logs,                 │
//! │                   work orders, commission expenses                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit ──► clear session ──► CheckoutOutcome                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Split Tickets
//! A cart mixing lab items (lenses going to a lab) with counter items
//! (solutions, cleaners, exams) becomes TWO sales: the counter half closes
//! immediately, the lab half tracks the job. The discount is prorated
//! across the halves by subtotal share and the entered payment fills the
//! counter ticket first.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use optika_core::{
    commission::{prepare_commission_expenses, CommissionContext},
    fees::resolve_fee_bps,
    inventory::reserve_stock,
    loyalty::award_points,
    pricing::price_cart,
    workorder::{prepare_work_orders, WorkOrderInput},
    LineItem, Money, PaymentDraft, Product, Sale, SaleItem, Terminal,
};
use optika_db::repository::sale::generate_sale_id;
use optika_db::Database;

use crate::error::{CheckoutError, CheckoutResult};
use crate::prompt::SplitPrompt;
use crate::session::{CheckoutSession, SessionState, TenderEntry};

// =============================================================================
// Outcome
// =============================================================================

/// One committed sale, as reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SaleSummary {
    pub sale_id: String,
    pub folio: String,
    pub total_cents: i64,
    pub paid_cents: i64,
    /// True for the lab half of a split ticket.
    pub is_lab: bool,
}

/// Everything a checkout produced.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub sales: Vec<SaleSummary>,
    pub work_orders_created: usize,
    pub expenses_recorded: usize,
    pub points_awarded: i64,
    pub referrer_points: i64,
}

// =============================================================================
// Ticket Groups
// =============================================================================

/// One sale-to-be within the checkout (the whole cart, or half a split).
struct TicketGroup {
    items: Vec<LineItem>,
    subtotal: Money,
    discount: Money,
    total: Money,
    payments: Vec<PaymentDraft>,
    is_lab: bool,
}

impl TicketGroup {
    fn paid(&self) -> Money {
        self.payments.iter().map(PaymentDraft::amount).sum()
    }
}

/// Splits the cart into ticket groups.
///
/// Counter first, lab second: payment allocation order is load-bearing
/// (the counter ticket is the one the customer takes home settled).
fn build_groups(session: &CheckoutSession, terminals: &HashMap<String, Terminal>) -> Vec<TicketGroup> {
    let (lab_items, counter_items): (Vec<LineItem>, Vec<LineItem>) = session
        .items
        .iter()
        .cloned()
        .partition(|item| item.requires_lab);

    let totals = price_cart(&session.items, &session.discount);

    if lab_items.is_empty() || counter_items.is_empty() {
        let mut group = TicketGroup {
            is_lab: !lab_items.is_empty(),
            items: session.items.clone(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            total: totals.total,
            payments: Vec::new(),
        };
        group.payments = allocate(&session.tenders, &[group.total], terminals).remove(0);
        return vec![group];
    }

    let counter_subtotal: Money = counter_items.iter().map(LineItem::line_total).sum();
    let lab_subtotal: Money = lab_items.iter().map(LineItem::line_total).sum();

    // Prorate the discount by subtotal share, half-up; the lab half takes
    // the remainder so the two discounts always reconcile to the whole.
    let counter_discount = totals.discount.prorate(counter_subtotal, totals.subtotal);
    let lab_discount = totals.discount - counter_discount;

    let counter_total = (counter_subtotal - counter_discount).clamp_zero();
    let lab_total = (lab_subtotal - lab_discount).clamp_zero();

    let mut allocations = allocate(
        &session.tenders,
        &[counter_total, lab_total],
        terminals,
    );
    let lab_payments = allocations.pop().unwrap_or_default();
    let counter_payments = allocations.pop().unwrap_or_default();

    vec![
        TicketGroup {
            items: counter_items,
            subtotal: counter_subtotal,
            discount: counter_discount,
            total: counter_total,
            payments: counter_payments,
            is_lab: false,
        },
        TicketGroup {
            items: lab_items,
            subtotal: lab_subtotal,
            discount: lab_discount,
            total: lab_total,
            payments: lab_payments,
            is_lab: true,
        },
    ]
}

/// Distributes the entered tenders across the group totals, in order.
///
/// Each tender fills the first group's remaining balance before spilling
/// into the next; whatever exceeds every total stays on the last group
/// (overpayment is accepted, change is a drawer concern). Non-positive
/// tenders are dropped. Card fees are resolved per portion.
fn allocate(
    tenders: &[TenderEntry],
    totals: &[Money],
    terminals: &HashMap<String, Terminal>,
) -> Vec<Vec<PaymentDraft>> {
    let mut out: Vec<Vec<PaymentDraft>> = totals.iter().map(|_| Vec::new()).collect();
    let mut remaining: Vec<Money> = totals.to_vec();

    for tender in tenders {
        let mut left = tender.amount();
        if !left.is_positive() {
            continue;
        }

        let group_count = remaining.len();
        for (idx, rem) in remaining.iter_mut().enumerate() {
            if !left.is_positive() {
                break;
            }
            let is_last = idx == group_count - 1;
            let portion = if is_last { left } else { left.min(*rem) };
            if !portion.is_positive() {
                continue;
            }

            let fee_rate = resolve_fee_bps(tender.terminal_id.as_deref(), tender.installments, terminals);
            out[idx].push(PaymentDraft {
                method: tender.method,
                amount_cents: portion.cents(),
                terminal_id: tender.terminal_id.clone(),
                card_type: tender.card_type,
                installments: tender.installments,
                fee_cents: portion.apply_rate(fee_rate).cents(),
            });

            *rem = (*rem - portion).clamp_zero();
            left -= portion;
        }
    }

    out
}

// =============================================================================
// Checkout
// =============================================================================

const SPLIT_PROMPT_TITLE: &str = "Split ticket";

/// Runs the full checkout for the session.
///
/// On success the session is cleared and the outcome describes every row
/// committed. On any error nothing was written and the cart is intact.
#[instrument(skip_all, fields(branch))]
pub async fn checkout<P: SplitPrompt>(
    state: &SessionState,
    db: &Database,
    prompt: &P,
) -> CheckoutResult<CheckoutOutcome> {
    let _guard = state.begin_processing()?;

    let session = state.with_session(CheckoutSession::snapshot).await;
    if session.items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    tracing::Span::current().record("branch", session.branch_id.as_str());

    let has_lab = session.items.iter().any(|i| i.requires_lab);
    let has_counter = session.items.iter().any(|i| !i.requires_lab);

    if has_lab && has_counter {
        let lab_count = session.items.iter().filter(|i| i.requires_lab).count();
        let message = format!(
            "This cart mixes {} lab item(s) with counter items. \
             It will be charged as two tickets: one for the counter items \
             and one tracking the lab job. Continue?",
            lab_count
        );
        if !prompt.confirm(SPLIT_PROMPT_TITLE, &message).await {
            info!("Split checkout declined by operator");
            return Err(CheckoutError::Cancelled);
        }
    }

    // Prefetch everything the pure preparers need.
    let product_ids: Vec<String> = session
        .items
        .iter()
        .filter_map(|i| i.product_id.clone())
        .collect();
    let mut products: HashMap<String, Product> = db.products().get_many(&product_ids).await?;
    let terminals = db.settings().list_terminals().await?;
    let loyalty = db.settings().get_loyalty_settings().await?;

    let groups = build_groups(&session, &terminals);

    // Reserve stock for every group against one working map, so a product
    // appearing in both halves of a split is checked against its combined
    // demand. Any shortage aborts here, before a single row is written.
    let mut plans = Vec::with_capacity(groups.len());
    for group in &groups {
        plans.push(reserve_stock(&group.items, &mut products)?);
    }

    let now = Utc::now();
    let has_referrer = session.referrer_id.is_some();

    let mut tx = db.begin_checkout().await?;
    let mut outcome = CheckoutOutcome {
        sales: Vec::with_capacity(groups.len()),
        work_orders_created: 0,
        expenses_recorded: 0,
        points_awarded: 0,
        referrer_points: 0,
    };

    for (group, plan) in groups.iter().zip(&plans) {
        let sale_id = generate_sale_id();
        let folio = tx.mint_folio().await?;
        let paid = group.paid();

        let award = award_points(&group.payments, has_referrer, &loyalty);

        let sale = Sale {
            id: sale_id.clone(),
            folio: folio.clone(),
            branch_id: session.branch_id.clone(),
            patient_id: session.patient_id.clone(),
            referrer_id: session.referrer_id.clone(),
            subtotal_cents: group.subtotal.cents(),
            discount_cents: group.discount.cents(),
            total_cents: group.total.cents(),
            points_awarded: award.points,
            referrer_points: award.referrer_points,
            notes: session.notes.clone(),
            created_at: now,
        };
        tx.insert_sale(&sale).await?;

        for item in &group.items {
            tx.insert_item(&SaleItem::from_line(&sale_id, item, now)).await?;
        }

        for payment in &group.payments {
            tx.insert_payment(&sale_id, payment).await?;
        }

        for update in &plan.updates {
            tx.apply_stock(update).await?;
        }
        for entry in &plan.logs {
            tx.insert_inventory_log(&sale_id, entry).await?;
        }

        let orders = prepare_work_orders(
            &group.items,
            &WorkOrderInput {
                sale_id: sale_id.clone(),
                branch_id: session.branch_id.clone(),
                patient_id: session.patient_id.clone(),
                created_at: now,
                total: group.total,
                paid,
            },
        );
        for order in &orders {
            tx.upsert_work_order(order).await?;
        }
        outcome.work_orders_created += orders.len();

        let expenses = prepare_commission_expenses(
            &group.payments,
            &terminals,
            &CommissionContext {
                sale_id: &sale_id,
                folio: &folio,
                branch_id: &session.branch_id,
                created_at: now,
            },
        );
        for expense in &expenses {
            tx.insert_expense(expense).await?;
        }
        outcome.expenses_recorded += expenses.len();

        outcome.points_awarded += award.points;
        outcome.referrer_points += award.referrer_points;

        info!(
            sale_id = %sale_id,
            folio = %folio,
            total = group.total.cents(),
            paid = paid.cents(),
            is_lab = group.is_lab,
            work_orders = orders.len(),
            "Sale prepared"
        );

        outcome.sales.push(SaleSummary {
            sale_id,
            folio,
            total_cents: group.total.cents(),
            paid_cents: paid.cents(),
            is_lab: group.is_lab,
        });
    }

    tx.commit().await?;

    state.with_session_mut(|s| s.clear()).await;

    if outcome.sales.len() > 1 {
        info!(count = outcome.sales.len(), "Split checkout committed");
    }

    Ok(outcome)
}

// =============================================================================
// Unit Tests
// =============================================================================
