//! # Domain Types
//!
//! Core domain types for the sales transaction engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │      Sale       │   │   WorkOrder     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  kind           │──►│  folio          │──►│  id (derived!)  │       │
//! │  │  quantity       │   │  total_cents    │   │  status         │       │
//! │  │  requires_lab   │   │  discount_cents │   │  frame_condition│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Payment      │   │    Terminal     │       │
//! │  │  current_stock  │   │  method         │   │  fee_bps        │       │
//! │  │  is_on_demand   │   │  installments   │   │  installment_   │       │
//! │  └─────────────────┘   └─────────────────┘   │  rates (map)    │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A sale freezes item descriptions and prices at checkout time: `SaleItem`
//! copies everything from the cart `LineItem`, so later catalog edits never
//! rewrite history.
//!
//! ## Deterministic Work-Order Identity
//! `WorkOrder.id` is derived from `(sale_id, sale_item_id)`, never random.
//! The composite key is the de-duplication mechanism: retrying a checkout
//! step can only ever upsert the same order, not mint a twin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::{Money, Rate};

// =============================================================================
// Item Kind
// =============================================================================

/// What a line item sells.
///
/// The three optical kinds (frames, lenses, contact lenses) are the ones
/// that can require lab work when they come out of tracked inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Frames,
    Lenses,
    ContactLens,
    Medication,
    Accessory,
    Consultation,
    Service,
    Other,
}

impl ItemKind {
    /// True for the kinds that involve the lab when stocked from inventory.
    pub const fn is_optical(&self) -> bool {
        matches!(self, ItemKind::Frames | ItemKind::Lenses | ItemKind::ContactLens)
    }
}

// =============================================================================
// Line Item (cart)
// =============================================================================

/// One purchasable unit in a cart, prices frozen at add time.
///
/// ## Invariants
/// - `quantity > 0`
/// - `unit_price_cents >= 0`
///
/// Both are enforced by the session boundary via [`crate::validation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Assigned when the item is added to the cart. Becomes the persisted
    /// sale-item id and therefore part of the work-order identity.
    pub id: String,
    pub kind: ItemKind,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Cost for margin / lab-cost tracking.
    pub cost_cents: Option<i64>,
    /// Link to a stock-tracked product, when the item came from inventory.
    pub product_id: Option<String>,
    /// True for optical kinds originating from inventory; drives both the
    /// split-ticket classification and work-order derivation.
    pub requires_lab: bool,
    pub lab_name: Option<String>,
    /// Serialized prescription snapshot carried onto the work order.
    pub rx_notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl LineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Payments
// =============================================================================

/// How a sale was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Check,
    /// Loyalty-point redemption. Never earns further points.
    Points,
    Other,
}

/// Card family, for card payments only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Debit,
    Credit,
}

/// One tender to apply to a sale, before persistence.
///
/// Card fields are flat rather than nested so the draft maps 1:1 onto the
/// payments table; non-card payments leave them empty and `installments`
/// at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub terminal_id: Option<String>,
    pub card_type: Option<CardType>,
    pub installments: u32,
    /// Terminal fee charged to the customer side, resolved at entry time.
    pub fee_cents: i64,
}

impl PaymentDraft {
    /// A plain (non-card) tender.
    pub fn simple(method: PaymentMethod, amount: Money) -> Self {
        PaymentDraft {
            method,
            amount_cents: amount.cents(),
            terminal_id: None,
            card_type: None,
            installments: 1,
            fee_cents: 0,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A persisted payment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub terminal_id: Option<String>,
    pub card_type: Option<CardType>,
    pub installments: u32,
    pub fee_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted sale. Immutable once created: cancellation/refund is a
/// collaborator concern, and balance is always derived from payments,
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Human-readable ticket number; split sales get one each.
    pub folio: String,
    pub branch_id: String,
    pub patient_id: Option<String>,
    /// Patient whose referral earned `referrer_points`, when one exists.
    pub referrer_id: Option<String>,
    /// Pre-discount gross.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// `max(0, subtotal - discount)`.
    pub total_cents: i64,
    /// Loyalty points earned by the buyer on this sale.
    pub points_awarded: i64,
    /// Loyalty points earned by the referring patient, when one exists.
    pub referrer_points: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A persisted sale line. Snapshot of the cart item at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    pub kind: ItemKind,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub cost_cents: Option<i64>,
    pub line_total_cents: i64,
    pub requires_lab: bool,
    pub lab_name: Option<String>,
    pub rx_notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Freezes a cart line into a persisted sale item.
    pub fn from_line(sale_id: &str, line: &LineItem, at: DateTime<Utc>) -> Self {
        SaleItem {
            id: line.id.clone(),
            sale_id: sale_id.to_string(),
            product_id: line.product_id.clone(),
            kind: line.kind,
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            cost_cents: line.cost_cents,
            line_total_cents: line.line_total().cents(),
            requires_lab: line.requires_lab,
            lab_name: line.lab_name.clone(),
            rx_notes: line.rx_notes.clone(),
            due_date: line.due_date,
            created_at: at,
        }
    }
}

// =============================================================================
// Work Orders
// =============================================================================

/// The kind of lab job a work order tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderKind {
    Lenses,
    ContactLens,
}

/// Work-order lifecycle.
///
/// `OnHold → ToPrepare → SentToLab → Ready → Delivered`, or `Cancelled`
/// (terminal). A job starts at `ToPrepare` only once at least half the sale
/// is paid; otherwise it waits at `OnHold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    OnHold,
    ToPrepare,
    SentToLab,
    Ready,
    Delivered,
    Cancelled,
}

/// A lab job derived from one lens or contact-lens sale item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WorkOrder {
    /// Deterministic: `wo_{sale_id}_{sale_item_id}`. See module docs.
    pub id: String,
    pub sale_id: String,
    pub sale_item_id: String,
    pub patient_id: Option<String>,
    pub branch_id: String,
    pub kind: WorkOrderKind,
    pub status: WorkOrderStatus,
    pub lab_name: Option<String>,
    pub lab_cost_cents: Option<i64>,
    /// Serialized prescription snapshot.
    pub rx_notes: Option<String>,
    /// Which frame the lenses go into, or the customer's-own-frame marker.
    pub frame_condition: Option<String>,
    pub is_paid: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product. The inventory preparer consumes prefetched copies of
/// these; it never reads the database itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub branch_id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ItemKind,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    pub current_stock: i64,
    /// On-demand products are exempt from stock tracking (always available).
    pub is_on_demand: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Inventory Plan Outputs
// =============================================================================

/// Absolute stock level to write for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub product_id: String,
    pub new_stock: i64,
}

/// The movement kind recorded in the inventory log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InventoryLogKind {
    Sale,
}

/// One pending log entry produced by the reservation preparer (transient,
/// no id/sale yet - the checkout transaction fills those in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLogEntry {
    pub product_id: String,
    /// Cart line that caused the movement.
    pub item_id: String,
    /// Negative for sales.
    pub quantity: i64,
    pub final_stock: i64,
}

/// A persisted inventory movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLog {
    pub id: String,
    pub product_id: String,
    pub sale_id: Option<String>,
    pub kind: InventoryLogKind,
    pub quantity: i64,
    pub final_stock: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Terminals
// =============================================================================

/// A configured card payment terminal.
///
/// `fee_bps` is the single-payment base fee; `installment_rates` maps an
/// installment count (3, 6, 9, 12 months) to its rate in bps. Lookups for
/// an absent bucket fall back to the base fee - a documented default, not
/// an accidental miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    pub name: String,
    pub fee_bps: u32,
    pub installment_rates: BTreeMap<u32, u32>,
}

impl Terminal {
    #[inline]
    pub fn base_fee(&self) -> Rate {
        Rate::from_bps(self.fee_bps)
    }

    /// Rate for the given installment bucket, if configured.
    pub fn installment_rate(&self, months: u32) -> Option<Rate> {
        self.installment_rates.get(&months).map(|bps| Rate::from_bps(*bps))
    }
}

// =============================================================================
// Loyalty
// =============================================================================

/// Loyalty program configuration (single record, read-only to this engine).
///
/// Earning rates are typed per-method overrides over an explicit global
/// rate; `rate_for` implements the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltySettings {
    pub enabled: bool,
    pub global_bps: u32,
    pub cash_bps: Option<u32>,
    pub card_bps: Option<u32>,
    pub transfer_bps: Option<u32>,
    pub referral_bps: u32,
}

impl LoyaltySettings {
    /// Earning rate for a payment method, falling back to the global rate
    /// when the method has no override.
    pub fn rate_for(&self, method: PaymentMethod) -> Rate {
        let bps = match method {
            PaymentMethod::Cash => self.cash_bps,
            PaymentMethod::Card => self.card_bps,
            PaymentMethod::Transfer => self.transfer_bps,
            _ => None,
        };
        Rate::from_bps(bps.unwrap_or(self.global_bps))
    }

    /// Rate for the referral award on the sale's earning total.
    pub fn referral_rate(&self) -> Rate {
        Rate::from_bps(self.referral_bps)
    }

    /// A disabled program (awards nothing).
    pub fn disabled() -> Self {
        LoyaltySettings {
            enabled: false,
            global_bps: 0,
            cash_bps: None,
            card_bps: None,
            transfer_bps: None,
            referral_bps: 0,
        }
    }
}

/// Points earned from one sale's payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyAward {
    pub points: i64,
    pub referrer_points: i64,
}

// =============================================================================
// Expenses
// =============================================================================

/// What an expense entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    BankCommission,
    Other,
}

/// A recordable expense before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub branch_id: String,
    pub category: ExpenseCategory,
    pub method: PaymentMethod,
    pub description: String,
    pub amount_cents: i64,
    /// Links a bank-commission expense back to the sale that incurred it.
    pub sale_id: Option<String>,
    pub incurred_at: DateTime<Utc>,
}

/// A persisted expense row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub branch_id: String,
    pub category: ExpenseCategory,
    pub method: PaymentMethod,
    pub description: String,
    pub amount_cents: i64,
    pub sale_id: Option<String>,
    pub incurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optical_kinds() {
        assert!(ItemKind::Frames.is_optical());
        assert!(ItemKind::Lenses.is_optical());
        assert!(ItemKind::ContactLens.is_optical());
        assert!(!ItemKind::Accessory.is_optical());
        assert!(!ItemKind::Consultation.is_optical());
    }

    #[test]
    fn test_line_total() {
        let line = LineItem {
            id: "li-1".to_string(),
            kind: ItemKind::Accessory,
            description: "Microfiber cloth".to_string(),
            quantity: 3,
            unit_price_cents: 299,
            cost_cents: None,
            product_id: None,
            requires_lab: false,
            lab_name: None,
            rx_notes: None,
            due_date: None,
        };
        assert_eq!(line.line_total().cents(), 897);
    }

    #[test]
    fn test_loyalty_rate_fallback() {
        let settings = LoyaltySettings {
            enabled: true,
            global_bps: 100,
            cash_bps: Some(200),
            card_bps: None,
            transfer_bps: None,
            referral_bps: 50,
        };
        assert_eq!(settings.rate_for(PaymentMethod::Cash).bps(), 200);
        assert_eq!(settings.rate_for(PaymentMethod::Card).bps(), 100);
        assert_eq!(settings.rate_for(PaymentMethod::Other).bps(), 100);
    }

    #[test]
    fn test_terminal_rates_roundtrip() {
        // installment_rates persists as JSON; object keys survive as u32
        let terminal = Terminal {
            id: "t-1".to_string(),
            name: "BBVA".to_string(),
            fee_bps: 350,
            installment_rates: BTreeMap::from([(3, 400), (6, 450)]),
        };
        let json = serde_json::to_string(&terminal.installment_rates).unwrap();
        let back: BTreeMap<u32, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, terminal.installment_rates);
        assert_eq!(terminal.installment_rate(6).unwrap().bps(), 450);
        assert!(terminal.installment_rate(9).is_none());
    }
}
