use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::SessionSnapshot;
use crate::store::SessionStore;

/// In-process store, mostly for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySessionStore {
    snapshot: RwLock<Option<SessionSnapshot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.snapshot.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_llm::Turn;

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = MemorySessionStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&SessionSnapshot::new(vec![Turn::user("hi")])).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().messages.len(), 1);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
