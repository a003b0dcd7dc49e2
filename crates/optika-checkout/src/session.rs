//! # Checkout Session
//!
//! The live cart and tender state for one register. Mutations all pass
//! through validation; money stays integer cents from the moment a value
//! enters the session.
//!
//! ## Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     SessionState Concurrency                            │
//! │                                                                         │
//! │  UI events (add item, set discount...) ──► Mutex<CheckoutSession>      │
//! │                                                                         │
//! │  "Charge" pressed twice?                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AtomicBool in-flight flag ── already set ──► CheckoutError::Busy      │
//! │       │                                                                 │
//! │       └── cleared when the ProcessingGuard drops (success OR error)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use optika_core::{
    pricing::{CartTotals, Discount, DiscountKind},
    validation, CardType, CoreResult, ItemKind, LineItem, Money, PaymentMethod,
    DEFAULT_BRANCH_ID,
};

use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Tender
// =============================================================================

/// One payment the cashier has keyed in, before fees are resolved.
#[derive(Debug, Clone)]
pub struct TenderEntry {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub terminal_id: Option<String>,
    pub card_type: Option<CardType>,
    pub installments: u32,
}

impl TenderEntry {
    /// A plain cash/transfer tender.
    pub fn simple(method: PaymentMethod, amount: Money) -> Self {
        TenderEntry {
            method,
            amount_cents: amount.cents(),
            terminal_id: None,
            card_type: None,
            installments: 1,
        }
    }

    /// A card tender routed through a terminal.
    pub fn card(
        amount: Money,
        terminal_id: impl Into<String>,
        card_type: CardType,
        installments: u32,
    ) -> Self {
        TenderEntry {
            method: PaymentMethod::Card,
            amount_cents: amount.cents(),
            terminal_id: Some(terminal_id.into()),
            card_type: Some(card_type),
            installments: installments.max(1),
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Everything a checkout needs, accumulated as the cashier works.
#[derive(Debug, Default)]
pub struct CheckoutSession {
    pub branch_id: String,
    pub patient_id: Option<String>,
    /// Patient who referred the buyer; earns referral points when set.
    pub referrer_id: Option<String>,
    pub items: Vec<LineItem>,
    pub discount: Discount,
    pub tenders: Vec<TenderEntry>,
    pub notes: Option<String>,
}

impl CheckoutSession {
    /// A fresh session for the default branch.
    pub fn new() -> Self {
        CheckoutSession {
            branch_id: DEFAULT_BRANCH_ID.to_string(),
            ..Default::default()
        }
    }

    /// Adds an item to the cart, validating quantity, price and cart size.
    /// Returns the assigned line id.
    pub fn add_item(&mut self, mut item: NewItem) -> CoreResult<String> {
        validation::validate_cart_size(self.items.len())?;
        validation::validate_quantity(item.quantity)?;
        validation::validate_price_cents(item.unit_price_cents)?;
        validation::validate_description(&item.description)?;

        item.description = item.description.trim().to_string();

        let id = Uuid::new_v4().to_string();
        self.items.push(LineItem {
            id: id.clone(),
            kind: item.kind,
            description: item.description,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            cost_cents: item.cost_cents,
            product_id: item.product_id,
            requires_lab: item.requires_lab,
            lab_name: item.lab_name,
            rx_notes: item.rx_notes,
            due_date: item.due_date,
        });
        Ok(id)
    }

    /// Changes the quantity of an existing line.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<bool> {
        validation::validate_quantity(quantity)?;

        match self.items.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes a line from the cart. Returns whether it existed.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != before
    }

    /// Sets the cart-level discount from operator input. Garbage input
    /// (unparseable, negative) clears the discount rather than erroring.
    pub fn set_discount(&mut self, kind: DiscountKind, raw: &str) {
        self.discount = Discount::parse(kind, raw);
    }

    /// Replaces the tender list.
    pub fn set_tenders(&mut self, tenders: Vec<TenderEntry>) {
        self.tenders = tenders;
    }

    /// Current cart totals (subtotal, discount, total).
    pub fn totals(&self) -> CartTotals {
        optika_core::pricing::price_cart(&self.items, &self.discount)
    }

    /// Sum of entered tenders.
    pub fn tendered(&self) -> Money {
        self.tenders.iter().map(TenderEntry::amount).sum()
    }

    /// Empties the session after a committed checkout.
    pub fn clear(&mut self) {
        self.items.clear();
        self.tenders.clear();
        self.discount = Discount::None;
        self.patient_id = None;
        self.referrer_id = None;
        self.notes = None;
    }

    /// Deep copy for the orchestrator to work on outside the lock.
    pub fn snapshot(&self) -> CheckoutSession {
        CheckoutSession {
            branch_id: self.branch_id.clone(),
            patient_id: self.patient_id.clone(),
            referrer_id: self.referrer_id.clone(),
            items: self.items.clone(),
            discount: self.discount,
            tenders: self.tenders.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Input for [`CheckoutSession::add_item`]; the session assigns the id.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub kind: ItemKind,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub cost_cents: Option<i64>,
    pub product_id: Option<String>,
    pub requires_lab: bool,
    pub lab_name: Option<String>,
    pub rx_notes: Option<String>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl NewItem {
    /// A counter item with no lab involvement.
    pub fn simple(kind: ItemKind, description: &str, quantity: i64, unit_price: Money) -> Self {
        NewItem {
            kind,
            description: description.to_string(),
            quantity,
            unit_price_cents: unit_price.cents(),
            cost_cents: None,
            product_id: None,
            requires_lab: false,
            lab_name: None,
            rx_notes: None,
            due_date: None,
        }
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// Thread-safe handle to one register's session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session: Arc<Mutex<CheckoutSession>>,
    in_flight: Arc<AtomicBool>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            session: Arc::new(Mutex::new(CheckoutSession::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Read access to the session.
    pub async fn with_session<R>(&self, f: impl FnOnce(&CheckoutSession) -> R) -> R {
        let session = self.session.lock().await;
        f(&session)
    }

    /// Write access to the session.
    pub async fn with_session_mut<R>(&self, f: impl FnOnce(&mut CheckoutSession) -> R) -> R {
        let mut session = self.session.lock().await;
        f(&mut session)
    }

    /// Claims the in-flight flag for the duration of a checkout.
    ///
    /// Returns `Busy` if another checkout on this session has the flag.
    /// The returned guard releases it on drop, including on error paths.
    pub fn begin_processing(&self) -> CheckoutResult<ProcessingGuard> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CheckoutError::Busy);
        }
        Ok(ProcessingGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }
}

/// RAII release of the in-flight flag.
#[derive(Debug)]
pub struct ProcessingGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
