//! # Sale Repository
//!
//! Read access to persisted sales, their lines and their payments, plus
//! identifier generation.
//!
//! Writes live in [`crate::repository::checkout`]: a sale only ever comes
//! into existence through the checkout transaction, together with its
//! items, payments, stock movements, work orders and commission expenses.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use optika_core::{Payment, Sale, SaleItem};

/// Repository for sale reads and identifiers.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>(
            "SELECT id, folio, branch_id, patient_id, referrer_id, subtotal_cents, \
             discount_cents, total_cents, points_awarded, referrer_points, \
             notes, created_at \
             FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Lists the line items of a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        Ok(sqlx::query_as::<_, SaleItem>(
            "SELECT id, sale_id, product_id, kind, description, quantity, \
             unit_price_cents, cost_cents, line_total_cents, requires_lab, \
             lab_name, rx_notes, due_date, created_at \
             FROM sale_items WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Lists the payments applied to a sale.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        Ok(sqlx::query_as::<_, Payment>(
            "SELECT id, sale_id, method, amount_cents, terminal_id, card_type, \
             installments, fee_cents, created_at \
             FROM payments WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Sum of payments on a sale, in cents. The outstanding balance is
    /// always derived (`total - paid`), never stored.
    pub async fn total_paid(&self, sale_id: &str) -> DbResult<i64> {
        let paid: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM payments WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(paid.unwrap_or(0))
    }

    /// Lists sales for a branch on a date range, newest first.
    pub async fn list_for_branch(&self, branch_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        Ok(sqlx::query_as::<_, Sale>(
            "SELECT id, folio, branch_id, patient_id, referrer_id, subtotal_cents, \
             discount_cents, total_cents, points_awarded, referrer_points, \
             notes, created_at \
             FROM sales WHERE branch_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(branch_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

// =============================================================================
// Identifier Generation
// =============================================================================
// Folios are minted inside the checkout transaction (see
// `CheckoutTx::mint_folio`) so the sequence comes from the persisted sales
// of the day, not process state.

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}

