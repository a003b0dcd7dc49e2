//! # Product Repository
//!
//! Database operations for products.
//!
//! The checkout path needs products as an in-memory map: the stock
//! reservation preparer works against prefetched copies, never against the
//! database. `get_many` is the batch fetch that feeds it.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use optika_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id("uuid-here").await?;
/// let map = repo.get_many(&ids).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str = "id, branch_id, sku, name, description, kind, \
     price_cents, cost_cents, current_stock, is_on_demand, is_active, \
     created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID.
    ///
    /// Returns `DbError::NotFound` if the product doesn't exist.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Product> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Batch-fetches products by ID into a map.
    ///
    /// Missing ids are simply absent from the result; the caller decides
    /// whether that is an error (the stock preparer treats it as one).
    pub async fn get_many(&self, ids: &[String]) -> DbResult<HashMap<String, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(count = ids.len(), "Fetching products by id");

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM products WHERE id IN (",
            PRODUCT_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let products: Vec<Product> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect())
    }

    /// Lists active products for a branch, sorted by name.
    pub async fn list_active(&self, branch_id: &str, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products \
             WHERE branch_id = ?1 AND is_active = 1 \
             ORDER BY name LIMIT ?2",
            PRODUCT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(branch_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO products \
             (id, branch_id, sku, name, description, kind, price_cents, \
              cost_cents, current_stock, is_on_demand, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&product.id)
        .bind(&product.branch_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.kind)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.current_stock)
        .bind(product.is_on_demand)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Restocks a product (receiving shipments, manual corrections).
    ///
    /// Checkout never calls this; sale deductions go through the checkout
    /// transaction so they commit with the sale.
    pub async fn set_stock(&self, id: &str, new_stock: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET current_stock = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(new_stock)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use optika_core::ItemKind;

    fn frame(id: &str, sku: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            branch_id: "branch-1".to_string(),
            sku: sku.to_string(),
            name: format!("Frame {}", sku),
            description: None,
            kind: ItemKind::Frames,
            price_cents: 120_000,
            cost_cents: Some(45_000),
            current_stock: stock,
            is_on_demand: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&frame("p1", "FR-001", 5)).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap();
        assert_eq!(found.sku, "FR-001");
        assert_eq!(found.current_stock, 5);
        assert_eq!(found.kind, ItemKind::Frames);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.products().get_by_id("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_many() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&frame("p1", "FR-001", 5)).await.unwrap();
        repo.insert(&frame("p2", "FR-002", 3)).await.unwrap();

        let map = repo
            .get_many(&["p1".to_string(), "p2".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("p1"));
        assert!(!map.contains_key("ghost"));

        // empty input short-circuits without touching SQL
        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&frame("p1", "FR-001", 5)).await.unwrap();
        repo.set_stock("p1", 20).await.unwrap();
        assert_eq!(repo.get_by_id("p1").await.unwrap().current_stock, 20);

        let err = repo.set_stock("ghost", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&frame("p1", "FR-001", 5)).await.unwrap();
        let err = repo.insert(&frame("p2", "FR-001", 5)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
