//! # Work-Order Preparer
//!
//! Derives zero or more lab work orders from a sale's line items.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items ──► any requires_lab? ── no ──► []  (counter sales never spawn   │
//! │                 │                          lab jobs)                    │
//! │                yes                                                      │
//! │                 ▼                                                       │
//! │  gate: paid/total >= 1/2 ? ToPrepare : OnHold                           │
//! │  (a job is only released to the lab once half the sale is paid)         │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  lenses ──► pair FIFO with the frames queue ──► WorkOrder (Lenses)      │
//! │             frames exhausted → "customer's own frame"                   │
//! │                                                                         │
//! │  contact lenses ──► fixed contact-lens lab ──► WorkOrder (ContactLens)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! `id = wo_{sale_id}_{sale_item_id}` - deterministic, so re-running the
//! derivation (checkout retry, reconciliation replay) produces the exact
//! same ids and downstream upserts cannot duplicate orders. Historical
//! duplicates in the system this replaces are precisely what this key
//! design exists to prevent.
//!
//! ## Pairing
//! The frame/lens pairing is deliberately a naive FIFO queue pop - the
//! first unassigned frame links to the first lens. No SKU or size
//! matching; it is a data-entry convenience and anything smarter would
//! diverge from historical behavior.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{ItemKind, LineItem, WorkOrder, WorkOrderKind, WorkOrderStatus};

/// Lab label applied to every contact-lens order.
pub const CONTACT_LENS_LAB: &str = "Contact Lens Lab";

/// Frame-condition marker when the customer supplies their own frame.
pub const CUSTOMER_OWN_FRAME: &str = "Customer's own frame";

/// Deterministic work-order id from the composite key.
#[inline]
pub fn work_order_id(sale_id: &str, sale_item_id: &str) -> String {
    format!("wo_{}_{}", sale_id, sale_item_id)
}

/// Sale-level inputs to the derivation.
#[derive(Debug, Clone)]
pub struct WorkOrderInput {
    pub sale_id: String,
    pub branch_id: String,
    pub patient_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// The sale total after discount.
    pub total: Money,
    /// The amount tendered against this sale at checkout.
    pub paid: Money,
}

impl WorkOrderInput {
    /// Initial status from the payment-ratio gate.
    ///
    /// Integer compare (`paid * 2 >= total`) so that exactly-half paid
    /// releases the job. A zero-total sale counts as fully paid.
    fn initial_status(&self) -> WorkOrderStatus {
        if self.total.cents() <= 0 || self.paid.cents() * 2 >= self.total.cents() {
            WorkOrderStatus::ToPrepare
        } else {
            WorkOrderStatus::OnHold
        }
    }
}

/// Derives the work orders for a sale.
///
/// One order per lens or contact-lens line; quantity on the line does not
/// multiply orders (the lab job covers the line). Calling this twice with
/// identical inputs yields orders with identical ids.
pub fn prepare_work_orders(items: &[LineItem], input: &WorkOrderInput) -> Vec<WorkOrder> {
    if !items.iter().any(|item| item.requires_lab) {
        return Vec::new();
    }

    let status = input.initial_status();

    let mut frames: VecDeque<&LineItem> = items
        .iter()
        .filter(|item| item.kind == ItemKind::Frames)
        .collect();

    let mut orders = Vec::new();

    for lens in items.iter().filter(|item| item.kind == ItemKind::Lenses) {
        let frame_condition = match frames.pop_front() {
            Some(frame) => format!("Frame: {}", frame.description),
            None => CUSTOMER_OWN_FRAME.to_string(),
        };

        orders.push(WorkOrder {
            id: work_order_id(&input.sale_id, &lens.id),
            sale_id: input.sale_id.clone(),
            sale_item_id: lens.id.clone(),
            patient_id: input.patient_id.clone(),
            branch_id: input.branch_id.clone(),
            kind: WorkOrderKind::Lenses,
            status,
            lab_name: lens.lab_name.clone(),
            lab_cost_cents: lens.cost_cents,
            rx_notes: lens.rx_notes.clone(),
            frame_condition: Some(frame_condition),
            is_paid: false,
            due_date: lens.due_date,
            created_at: input.created_at,
            updated_at: input.created_at,
        });
    }

    for contact in items.iter().filter(|item| item.kind == ItemKind::ContactLens) {
        orders.push(WorkOrder {
            id: work_order_id(&input.sale_id, &contact.id),
            sale_id: input.sale_id.clone(),
            sale_item_id: contact.id.clone(),
            patient_id: input.patient_id.clone(),
            branch_id: input.branch_id.clone(),
            kind: WorkOrderKind::ContactLens,
            status,
            lab_name: Some(CONTACT_LENS_LAB.to_string()),
            lab_cost_cents: contact.cost_cents,
            rx_notes: contact.rx_notes.clone(),
            frame_condition: None,
            is_paid: false,
            due_date: contact.due_date,
            created_at: input.created_at,
            updated_at: input.created_at,
        });
    }

    orders
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_line(id: &str, kind: ItemKind, description: &str) -> LineItem {
        LineItem {
            id: id.to_string(),
            kind,
            description: description.to_string(),
            quantity: 1,
            unit_price_cents: 80_000,
            cost_cents: Some(30_000),
            product_id: Some(format!("prod-{}", id)),
            requires_lab: true,
            lab_name: Some("Essilor".to_string()),
            rx_notes: Some("OD -1.25 / OI -1.50".to_string()),
            due_date: None,
        }
    }

    fn counter_line(id: &str) -> LineItem {
        LineItem {
            id: id.to_string(),
            kind: ItemKind::Accessory,
            description: "Lens cleaner".to_string(),
            quantity: 1,
            unit_price_cents: 15_000,
            cost_cents: None,
            product_id: None,
            requires_lab: false,
            lab_name: None,
            rx_notes: None,
            due_date: None,
        }
    }

    fn input(total_cents: i64, paid_cents: i64) -> WorkOrderInput {
        WorkOrderInput {
            sale_id: "sale-1".to_string(),
            branch_id: "branch-1".to_string(),
            patient_id: Some("patient-1".to_string()),
            created_at: Utc::now(),
            total: Money::from_cents(total_cents),
            paid: Money::from_cents(paid_cents),
        }
    }

    #[test]
    fn test_counter_sales_spawn_nothing() {
        let items = vec![counter_line("li1"), counter_line("li2")];
        assert!(prepare_work_orders(&items, &input(30_000, 30_000)).is_empty());
    }

    /// Exactly half paid releases the job; a cent under holds it.
    #[test]
    fn test_payment_ratio_gate() {
        let items = vec![lab_line("li1", ItemKind::Lenses, "Progressives")];

        let released = prepare_work_orders(&items, &input(10_000, 5_000));
        assert_eq!(released[0].status, WorkOrderStatus::ToPrepare);

        let held = prepare_work_orders(&items, &input(10_000, 4_900));
        assert_eq!(held[0].status, WorkOrderStatus::OnHold);

        // zero-total sale counts as fully paid
        let free = prepare_work_orders(&items, &input(0, 0));
        assert_eq!(free[0].status, WorkOrderStatus::ToPrepare);
    }

    /// Same inputs, same ids - the idempotence the upsert relies on.
    #[test]
    fn test_ids_are_deterministic() {
        let items = vec![
            lab_line("li1", ItemKind::Lenses, "Progressives"),
            lab_line("li2", ItemKind::ContactLens, "Monthly torics"),
        ];
        let first = prepare_work_orders(&items, &input(160_000, 160_000));
        let second = prepare_work_orders(&items, &input(160_000, 160_000));

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, "wo_sale-1_li1");
        assert_eq!(first[1].id, "wo_sale-1_li2");
        assert_eq!(
            first.iter().map(|wo| wo.id.clone()).collect::<Vec<_>>(),
            second.iter().map(|wo| wo.id.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_fifo_frame_pairing() {
        let items = vec![
            lab_line("f1", ItemKind::Frames, "Ray-Ban RX5154"),
            lab_line("f2", ItemKind::Frames, "Oakley OX8046"),
            lab_line("l1", ItemKind::Lenses, "Single vision"),
            lab_line("l2", ItemKind::Lenses, "Progressives"),
            lab_line("l3", ItemKind::Lenses, "Blue filter"),
        ];
        let orders = prepare_work_orders(&items, &input(400_000, 400_000));

        // frames pair in cart order; the third lens gets the customer marker
        let lens_orders: Vec<_> = orders
            .iter()
            .filter(|wo| wo.kind == WorkOrderKind::Lenses)
            .collect();
        assert_eq!(lens_orders.len(), 3);
        assert_eq!(
            lens_orders[0].frame_condition.as_deref(),
            Some("Frame: Ray-Ban RX5154")
        );
        assert_eq!(
            lens_orders[1].frame_condition.as_deref(),
            Some("Frame: Oakley OX8046")
        );
        assert_eq!(lens_orders[2].frame_condition.as_deref(), Some(CUSTOMER_OWN_FRAME));
    }

    #[test]
    fn test_contact_lens_orders() {
        let items = vec![lab_line("c1", ItemKind::ContactLens, "Monthly torics")];
        let orders = prepare_work_orders(&items, &input(50_000, 50_000));

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].kind, WorkOrderKind::ContactLens);
        assert_eq!(orders[0].lab_name.as_deref(), Some(CONTACT_LENS_LAB));
        assert!(orders[0].frame_condition.is_none());
        assert!(!orders[0].is_paid);
    }

    /// A lone frame sale requires the lab flag but derives no order by
    /// itself (frames only ride along with lenses).
    #[test]
    fn test_frames_alone_spawn_nothing() {
        let items = vec![lab_line("f1", ItemKind::Frames, "Ray-Ban RX5154")];
        assert!(prepare_work_orders(&items, &input(120_000, 120_000)).is_empty());
    }
}
