//! # optika-checkout: Checkout Orchestration for Optika POS
//!
//! The flow layer between the UI and the engine. Holds the live cart
//! session, decides whether a ticket splits, runs the pure preparers from
//! `optika-core`, and commits the whole write set through `optika-db`'s
//! checkout transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Optika POS Checkout Flow                            │
//! │                                                                         │
//! │  UI / front end                                                        │
//! │       │  add_item, set_discount, set_tenders, checkout                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                optika-checkout (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐   ┌───────────┐   ┌──────────────────────┐    │   │
//! │  │   │  session  │   │  prompt   │   │      checkout        │    │   │
//! │  │   │ SessionSt │   │SplitPrompt│   │  the orchestrator    │    │   │
//! │  │   └───────────┘   └───────────┘   └──────────────────────┘    │   │
//! │  └───────────────┬───────────────────────────┬─────────────────────┘   │
//! │                  │ pure math                 │ one transaction         │
//! │                  ▼                           ▼                         │
//! │            optika-core                  optika-db                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - Cart state, tender entries, the in-flight guard
//! - [`prompt`] - The split-ticket confirmation seam
//! - [`checkout`] - The orchestrator
//! - [`error`] - Checkout error types with user-facing messages

pub mod checkout;
pub mod error;
pub mod prompt;
pub mod session;

pub use checkout::{checkout, CheckoutOutcome, SaleSummary};
pub use error::{CheckoutError, CheckoutResult};
pub use prompt::{AutoConfirm, AutoDecline, SplitPrompt};
pub use session::{CheckoutSession, NewItem, SessionState, TenderEntry};
