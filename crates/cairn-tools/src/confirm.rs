use async_trait::async_trait;

/// Confirmation gate for tools with persistent side effects
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Ask the user; `true` means go ahead
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Approves every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Confirm for AutoApprove {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecline;

#[async_trait]
impl Confirm for AutoDecline {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
