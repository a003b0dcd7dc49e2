//! # Expense Repository
//!
//! Reads over the expense ledger. Bank-commission expenses are written by
//! the checkout transaction; manual expenses come through `insert`.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use optika_core::{Expense, ExpenseDraft};

const EXPENSE_COLUMNS: &str = "id, branch_id, category, method, description, \
     amount_cents, sale_id, incurred_at, created_at";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records a manual expense (rent, supplies, payroll advances).
    pub async fn insert(&self, draft: &ExpenseDraft) -> DbResult<Expense> {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            branch_id: draft.branch_id.clone(),
            category: draft.category,
            method: draft.method,
            description: draft.description.clone(),
            amount_cents: draft.amount_cents,
            sale_id: draft.sale_id.clone(),
            incurred_at: draft.incurred_at,
            created_at: chrono::Utc::now(),
        };

        sqlx::query(
            "INSERT INTO expenses \
             (id, branch_id, category, method, description, amount_cents, \
              sale_id, incurred_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&expense.id)
        .bind(&expense.branch_id)
        .bind(expense.category)
        .bind(expense.method)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(&expense.sale_id)
        .bind(expense.incurred_at)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists the expenses linked to a sale (its bank commissions).
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Expense>> {
        let sql = format!(
            "SELECT {} FROM expenses WHERE sale_id = ?1 ORDER BY rowid",
            EXPENSE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Expense>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Lists recent expenses for a branch, newest first.
    pub async fn list_for_branch(&self, branch_id: &str, limit: u32) -> DbResult<Vec<Expense>> {
        let sql = format!(
            "SELECT {} FROM expenses \
             WHERE branch_id = ?1 ORDER BY incurred_at DESC LIMIT ?2",
            EXPENSE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Expense>(&sql)
            .bind(branch_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }
}
