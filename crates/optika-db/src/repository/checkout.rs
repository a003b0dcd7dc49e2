//! # Checkout Transaction
//!
//! The single write path for checkout. Every row a checkout produces is
//! written through one SQLite transaction and committed together.
//!
//! ## Why One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Write Set                                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── sales            (1 row, or 2 for a split ticket)               │
//! │    ├── sale_items       (snapshot of every cart line)                  │
//! │    ├── payments         (one row per tender)                           │
//! │    ├── products         (stock decrements)                             │
//! │    ├── inventory_log    (audit trail per decrement)                    │
//! │    ├── work_orders      (upsert on derived id)                         │
//! │    └── expenses         (bank commissions)                             │
//! │    │                                                                    │
//! │  COMMIT ── all of it, or none of it                                    │
//! │                                                                         │
//! │  A split ticket writes BOTH sales inside the same transaction:         │
//! │  there is no state where the counter half exists without the lab half. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a `CheckoutTx` without calling [`CheckoutTx::commit`] rolls
//! everything back (sqlx transaction drop semantics).

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::sale::generate_payment_id;
use optika_core::{
    ExpenseDraft, InventoryLogEntry, Payment, PaymentDraft, Sale, SaleItem, StockUpdate,
    WorkOrder,
};

/// An open checkout transaction.
///
/// Obtained from [`crate::pool::Database::begin_checkout`]. Methods write
/// within the transaction; nothing is visible to readers until `commit`.
#[derive(Debug)]
pub struct CheckoutTx<'t> {
    tx: Transaction<'t, Sqlite>,
}

impl CheckoutTx<'static> {
    /// Begins a new checkout transaction on the pool.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin().await?;
        Ok(CheckoutTx { tx })
    }
}

impl<'t> CheckoutTx<'t> {
    /// Mints the next folio of the day: `V-YYYYMMDD-NNNN`.
    ///
    /// The sequence is the count of folios already carrying today's date
    /// prefix, read inside this transaction so the second half of a split
    /// ticket sees the first. Counting persisted rows keeps folios dense
    /// and collision-free across restarts; the UNIQUE constraint on
    /// `sales.folio` backstops concurrent writers.
    pub async fn mint_folio(&mut self) -> DbResult<String> {
        let date_part = Utc::now().format("%Y%m%d").to_string();

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE folio LIKE ?1")
            .bind(format!("V-{}-%", date_part))
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(format!("V-{}-{:04}", date_part, taken + 1))
    }

    /// Inserts a sale row.
    pub async fn insert_sale(&mut self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, folio = %sale.folio, total = sale.total_cents, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales \
             (id, folio, branch_id, patient_id, referrer_id, subtotal_cents, \
              discount_cents, total_cents, points_awarded, referrer_points, \
              notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&sale.id)
        .bind(&sale.folio)
        .bind(&sale.branch_id)
        .bind(&sale.patient_id)
        .bind(&sale.referrer_id)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.points_awarded)
        .bind(sale.referrer_points)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Inserts a sale item (the immutable snapshot of a cart line).
    pub async fn insert_item(&mut self, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_items \
             (id, sale_id, product_id, kind, description, quantity, \
              unit_price_cents, cost_cents, line_total_cents, requires_lab, \
              lab_name, rx_notes, due_date, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.kind)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.cost_cents)
        .bind(item.line_total_cents)
        .bind(item.requires_lab)
        .bind(&item.lab_name)
        .bind(&item.rx_notes)
        .bind(item.due_date)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Inserts a payment against a sale. Returns the persisted row.
    pub async fn insert_payment(
        &mut self,
        sale_id: &str,
        draft: &PaymentDraft,
    ) -> DbResult<Payment> {
        let payment = Payment {
            id: generate_payment_id(),
            sale_id: sale_id.to_string(),
            method: draft.method,
            amount_cents: draft.amount_cents,
            terminal_id: draft.terminal_id.clone(),
            card_type: draft.card_type,
            installments: draft.installments,
            fee_cents: draft.fee_cents,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO payments \
             (id, sale_id, method, amount_cents, terminal_id, card_type, \
              installments, fee_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(&payment.terminal_id)
        .bind(payment.card_type)
        .bind(payment.installments)
        .bind(payment.fee_cents)
        .bind(payment.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(payment)
    }

    /// Writes one absolute stock level computed by the reservation
    /// preparer. Fails if the product vanished since prefetch.
    pub async fn apply_stock(&mut self, update: &StockUpdate) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET current_stock = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(update.new_stock)
        .bind(Utc::now())
        .bind(&update.product_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &update.product_id));
        }
        Ok(())
    }

    /// Records one stock movement in the audit log.
    pub async fn insert_inventory_log(
        &mut self,
        sale_id: &str,
        entry: &InventoryLogEntry,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO inventory_log \
             (id, product_id, sale_id, sale_item_id, kind, quantity, final_stock, created_at) \
             VALUES (?1, ?2, ?3, ?4, 'sale', ?5, ?6, ?7)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.product_id)
        .bind(sale_id)
        .bind(&entry.item_id)
        .bind(entry.quantity)
        .bind(entry.final_stock)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Upserts a work order by its derived id.
    ///
    /// `DO NOTHING` on conflict: the id encodes sale + item, so a replayed
    /// derivation is the same job and must not duplicate or clobber a
    /// status the lab has since advanced.
    pub async fn upsert_work_order(&mut self, order: &WorkOrder) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO work_orders \
             (id, sale_id, sale_item_id, patient_id, branch_id, kind, status, \
              lab_name, lab_cost_cents, rx_notes, frame_condition, is_paid, \
              due_date, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&order.id)
        .bind(&order.sale_id)
        .bind(&order.sale_item_id)
        .bind(&order.patient_id)
        .bind(&order.branch_id)
        .bind(order.kind)
        .bind(order.status)
        .bind(&order.lab_name)
        .bind(order.lab_cost_cents)
        .bind(&order.rx_notes)
        .bind(&order.frame_condition)
        .bind(order.is_paid)
        .bind(order.due_date)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Inserts an expense (bank commissions at checkout).
    pub async fn insert_expense(&mut self, draft: &ExpenseDraft) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO expenses \
             (id, branch_id, category, method, description, amount_cents, \
              sale_id, incurred_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&draft.branch_id)
        .bind(draft.category)
        .bind(draft.method)
        .bind(&draft.description)
        .bind(draft.amount_cents)
        .bind(&draft.sale_id)
        .bind(draft.incurred_at)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Commits the whole write set.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Explicit rollback. Dropping the transaction does the same.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
