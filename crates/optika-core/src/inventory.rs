//! # Inventory Reservation Preparer
//!
//! Validates stock availability for a set of cart lines and produces the
//! stock-decrement + log-entry set. Pure transformation: no I/O here; the
//! checkout transaction applies the plan atomically with the sale write.
//!
//! ## Plan Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each line with a product_id:                                       │
//! │                                                                         │
//! │    product missing from map ──► ProductNotFound (abort everything)      │
//! │    product is on-demand     ──► skip (no stock tracking)                │
//! │    stock < quantity         ──► InsufficientStock (abort everything)    │
//! │    otherwise                ──► new_stock = stock - quantity            │
//! │                                 emit StockUpdate + sale log entry       │
//! │                                 decrement the working map in place      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The working map is mutated as lines are reserved, so two lines selling
//! the same product - or the counter and lab halves of a split sale
//! reserving against the same prefetched snapshot - see each other's
//! deductions. Stock can never go negative by construction.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{InventoryLogEntry, LineItem, Product, StockUpdate};

/// The reservation output: absolute stock writes plus one log entry per
/// reserved line. Applied by the caller, atomically with the sale.
#[derive(Debug, Clone, Default)]
pub struct InventoryPlan {
    pub updates: Vec<StockUpdate>,
    pub logs: Vec<InventoryLogEntry>,
}

impl InventoryPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Builds the reservation plan for `items` against prefetched `products`.
///
/// Fails closed: the first missing product or short stock aborts the whole
/// plan - partial reservations are never returned.
pub fn reserve_stock(
    items: &[LineItem],
    products: &mut HashMap<String, Product>,
) -> CoreResult<InventoryPlan> {
    let mut plan = InventoryPlan::default();

    for item in items {
        let Some(product_id) = item.product_id.as_deref() else {
            continue; // ad-hoc line, nothing tracked
        };

        let product = products
            .get_mut(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if product.is_on_demand {
            continue;
        }

        if product.current_stock < item.quantity {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.current_stock,
                requested: item.quantity,
            });
        }

        let new_stock = product.current_stock - item.quantity;
        product.current_stock = new_stock;

        plan.updates.push(StockUpdate {
            product_id: product_id.to_string(),
            new_stock,
        });
        plan.logs.push(InventoryLogEntry {
            product_id: product_id.to_string(),
            item_id: item.id.clone(),
            quantity: -item.quantity,
            final_stock: new_stock,
        });
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;
    use chrono::Utc;

    fn product(id: &str, stock: i64, on_demand: bool) -> Product {
        Product {
            id: id.to_string(),
            branch_id: "branch-1".to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            description: None,
            kind: ItemKind::Frames,
            price_cents: 120_000,
            cost_cents: Some(48_000),
            current_stock: stock,
            is_on_demand: on_demand,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(id: &str, product_id: Option<&str>, qty: i64) -> LineItem {
        LineItem {
            id: id.to_string(),
            kind: ItemKind::Frames,
            description: format!("Line {}", id),
            quantity: qty,
            unit_price_cents: 120_000,
            cost_cents: None,
            product_id: product_id.map(str::to_string),
            requires_lab: true,
            lab_name: None,
            rx_notes: None,
            due_date: None,
        }
    }

    #[test]
    fn test_stock_gate_rejects_short_stock() {
        let mut products = HashMap::from([("p1".to_string(), product("p1", 5, false))]);
        let items = vec![line("li1", Some("p1"), 6)];

        let err = reserve_stock(&items, &mut products).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                name,
                available,
                requested,
            } => {
                assert_eq!(name, "Product p1");
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_stock_drains_to_zero() {
        let mut products = HashMap::from([("p1".to_string(), product("p1", 5, false))]);
        let items = vec![line("li1", Some("p1"), 5)];

        let plan = reserve_stock(&items, &mut products).unwrap();
        assert_eq!(plan.updates, vec![StockUpdate { product_id: "p1".to_string(), new_stock: 0 }]);
        assert_eq!(plan.logs.len(), 1);
        assert_eq!(plan.logs[0].quantity, -5);
        assert_eq!(plan.logs[0].final_stock, 0);
    }

    #[test]
    fn test_missing_product_aborts_whole_plan() {
        let mut products = HashMap::from([("p1".to_string(), product("p1", 10, false))]);
        let items = vec![line("li1", Some("p1"), 1), line("li2", Some("ghost"), 1)];

        let err = reserve_stock(&items, &mut products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_on_demand_products_skip_deduction() {
        let mut products = HashMap::from([("p1".to_string(), product("p1", 0, true))]);
        let items = vec![line("li1", Some("p1"), 3)];

        let plan = reserve_stock(&items, &mut products).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_untracked_lines_are_ignored() {
        let mut products = HashMap::new();
        let items = vec![line("li1", None, 2)];

        let plan = reserve_stock(&items, &mut products).unwrap();
        assert!(plan.is_empty());
    }

    /// Two lines against the same product reserve cumulatively.
    #[test]
    fn test_repeated_product_accumulates() {
        let mut products = HashMap::from([("p1".to_string(), product("p1", 5, false))]);
        let items = vec![line("li1", Some("p1"), 2), line("li2", Some("p1"), 3)];

        let plan = reserve_stock(&items, &mut products).unwrap();
        assert_eq!(plan.updates.last().unwrap().new_stock, 0);

        // a third unit is no longer available
        let more = vec![line("li3", Some("p1"), 1)];
        assert!(reserve_stock(&more, &mut products).is_err());
    }
}
