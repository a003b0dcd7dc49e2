//! # Work-Order Repository
//!
//! Lifecycle operations for lab work orders.
//!
//! Creation happens inside the checkout transaction (an upsert keyed on
//! the derived id). What lives here is everything that happens to a job
//! after the sale: status moves through the lab pipeline and the paid
//! flag flipping once the balance is covered.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use optika_core::{WorkOrder, WorkOrderStatus};

const WORK_ORDER_COLUMNS: &str = "id, sale_id, sale_item_id, patient_id, branch_id, \
     kind, status, lab_name, lab_cost_cents, rx_notes, frame_condition, \
     is_paid, due_date, created_at, updated_at";

/// Repository for work-order database operations.
#[derive(Debug, Clone)]
pub struct WorkOrderRepository {
    pool: SqlitePool,
}

impl WorkOrderRepository {
    /// Creates a new WorkOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WorkOrderRepository { pool }
    }

    /// Gets a work order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<WorkOrder> {
        let sql = format!("SELECT {} FROM work_orders WHERE id = ?1", WORK_ORDER_COLUMNS);
        sqlx::query_as::<_, WorkOrder>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("WorkOrder", id))
    }

    /// Lists the work orders spawned by a sale.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<WorkOrder>> {
        let sql = format!(
            "SELECT {} FROM work_orders WHERE sale_id = ?1 ORDER BY rowid",
            WORK_ORDER_COLUMNS
        );
        Ok(sqlx::query_as::<_, WorkOrder>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lists work orders in a given status for a branch, oldest first
    /// (the lab queue view).
    pub async fn list_by_status(
        &self,
        branch_id: &str,
        status: WorkOrderStatus,
    ) -> DbResult<Vec<WorkOrder>> {
        let sql = format!(
            "SELECT {} FROM work_orders \
             WHERE branch_id = ?1 AND status = ?2 ORDER BY created_at",
            WORK_ORDER_COLUMNS
        );
        Ok(sqlx::query_as::<_, WorkOrder>(&sql)
            .bind(branch_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Moves a work order to a new status.
    pub async fn update_status(&self, id: &str, status: WorkOrderStatus) -> DbResult<()> {
        debug!(id = %id, status = ?status, "Updating work order status");

        let result = sqlx::query(
            "UPDATE work_orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("WorkOrder", id));
        }
        Ok(())
    }

    /// Marks a work order as paid, releasing it to the lab if it was held.
    ///
    /// Called when subsequent payments on the sale push the paid ratio
    /// past the release threshold.
    pub async fn mark_paid(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE work_orders \
             SET is_paid = 1, \
                 status = CASE WHEN status = 'on_hold' THEN 'to_prepare' ELSE status END, \
                 updated_at = ?1 \
             WHERE id = ?2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("WorkOrder", id));
        }
        Ok(())
    }
}
