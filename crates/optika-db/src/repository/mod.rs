//! # Repository Module
//!
//! Database repository implementations for Optika POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Checkout orchestrator                                                 │
//! │       │                                                                 │
//! │       │  db.products().get_many(&ids)                                  │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── get_many(&self, ids)                                              │
//! │  └── insert(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The orchestrator never writes SQL                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product reads and inventory queries
//! - [`sale::SaleRepository`] - Sale, item and payment reads; folio numbers
//! - [`work_order::WorkOrderRepository`] - Lab job lifecycle
//! - [`expense::ExpenseRepository`] - Expense reads
//! - [`settings::SettingsRepository`] - Terminals and the loyalty program
//! - [`checkout::CheckoutTx`] - The single write transaction for checkout

pub mod checkout;
pub mod expense;
pub mod product;
pub mod sale;
pub mod settings;
pub mod work_order;
