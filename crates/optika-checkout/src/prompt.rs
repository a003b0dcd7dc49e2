//! # Split Confirmation Prompt
//!
//! A mixed cart (lab items alongside counter items) is split into two
//! tickets, but only with the cashier's say-so. The orchestrator is
//! generic over who answers; the UI plugs in here.

/// Asks the operator a yes/no question before a split checkout proceeds.
pub trait SplitPrompt: Send + Sync {
    /// Returns true to proceed with the split, false to cancel checkout.
    fn confirm(
        &self,
        title: &str,
        message: &str,
    ) -> impl std::future::Future<Output = bool> + Send;
}

/// Always proceeds. For headless flows and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl SplitPrompt for AutoConfirm {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }
}

/// Always cancels. For tests of the cancellation path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecline;

impl SplitPrompt for AutoDecline {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        false
    }
}
