use async_trait::async_trait;

use crate::error::Result;
use crate::models::SessionSnapshot;

/// Trait for session persistence
///
/// The blob is opaque to the store; callers validate what they hydrate.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the saved session, `None` if nothing was saved yet
    async fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// Replace the saved session
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Forget the saved session
    async fn clear(&self) -> Result<()>;
}
