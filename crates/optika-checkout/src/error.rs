//! # Checkout Error Types
//!
//! Everything that can stop a checkout, with a user-facing message for
//! the counter staff separate from the debug detail.

use thiserror::Error;

use optika_core::CoreError;
use optika_db::DbError;

/// Errors surfaced by the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requested on an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Another checkout on this session is still in flight.
    #[error("a checkout is already in progress")]
    Busy,

    /// The cashier declined the split-ticket confirmation.
    #[error("checkout cancelled")]
    Cancelled,

    /// A business rule failed (insufficient stock, unknown product).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failed; nothing was written.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl CheckoutError {
    /// Message suitable for showing at the counter.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::EmptyCart => "Add at least one item before charging.".to_string(),
            CheckoutError::Busy => "This sale is already being processed.".to_string(),
            CheckoutError::Cancelled => "Checkout cancelled.".to_string(),
            CheckoutError::Core(CoreError::InsufficientStock {
                name,
                available,
                requested,
            }) => format!(
                "Not enough stock of {}: {} available, {} requested.",
                name, available, requested
            ),
            CheckoutError::Core(e) => e.to_string(),
            CheckoutError::Db(_) => {
                "Could not save the sale. Nothing was charged; try again.".to_string()
            }
        }
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_message_names_the_product() {
        let err = CheckoutError::Core(CoreError::InsufficientStock {
            name: "Ray-Ban RX5154".to_string(),
            available: 1,
            requested: 2,
        });
        let msg = err.user_message();
        assert!(msg.contains("Ray-Ban RX5154"));
        assert!(msg.contains("1 available"));
    }

    #[test]
    fn test_db_failure_message_hides_detail() {
        let err = CheckoutError::Db(DbError::Internal("disk I/O error".to_string()));
        assert!(!err.user_message().contains("disk"));
    }
}
