use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{error::Result, modal::BookingModal};

/// Trait for storing and retrieving booking sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: BookingModal) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<BookingModal>>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn len(&self) -> Result<usize>;
}

/// In-memory implementation of SessionStorage.
///
/// Sessions are handles, so a stored session keeps seeing the updates made
/// through any clone of it.
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, BookingModal>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: BookingModal) -> Result<()> {
        self.sessions.insert(session.id().to_string(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<BookingModal>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.sessions.len())
    }
}

/// Remove a closed session from `storage` once `grace` has passed.
///
/// Call right after closing. The session stays if it was reopened (or
/// closed again) in the meantime; the later close schedules its own eviction.
pub fn evict_after_close(
    storage: Arc<dyn SessionStorage>,
    session: BookingModal,
    grace: Duration,
) -> JoinHandle<()> {
    let epoch = session.epoch();
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        if session.is_open() || session.epoch() != epoch {
            debug!(session_id = %session.id(), "Session reopened, keeping it");
            return;
        }
        match storage.delete(session.id()).await {
            Ok(()) => info!(session_id = %session.id(), "Closed booking session evicted"),
            Err(e) => warn!(session_id = %session.id(), error = %e, "Failed to evict session"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BookingConfig, draft::FieldUpdate, modal::BookingServices};
    use chrono::NaiveDate;

    fn window_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn stored(storage: &InMemorySessionStorage, id: &str) -> bool {
        storage.sessions.contains_key(id)
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_is_evicted_after_grace() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let services = BookingServices::with_mocks(BookingConfig::default());
        let grace = services.config.reset_grace();
        let modal = BookingModal::new("session1", services);
        storage.save(modal.clone()).await.unwrap();
        modal.open(None, window_start());

        modal.close();
        let eviction = evict_after_close(storage.clone(), modal.clone(), grace);
        assert_eq!(storage.len().await.unwrap(), 1);

        eviction.await.unwrap();
        assert_eq!(storage.len().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reopened_session_is_not_evicted() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let services = BookingServices::with_mocks(BookingConfig::default());
        let grace = services.config.reset_grace();
        let modal = BookingModal::new("session1", services);
        storage.save(modal.clone()).await.unwrap();
        modal.open(None, window_start());

        modal.close();
        let eviction = evict_after_close(storage.clone(), modal.clone(), grace);
        modal.open(None, window_start());

        eviction.await.unwrap();
        assert!(stored(&storage, "session1"));
    }

    #[tokio::test(start_paused = true)]
    async fn stored_sessions_share_state_with_their_handles() {
        let storage = InMemorySessionStorage::new();
        let modal = BookingModal::new("session1", BookingServices::with_mocks(BookingConfig::default()));
        storage.save(modal.clone()).await.unwrap();

        modal.open(None, window_start());
        modal.set_field(FieldUpdate::Email("anna@beispiel.ch".to_string())).unwrap();

        let retrieved = storage.get("session1").await.unwrap().unwrap();
        assert!(retrieved.is_open());
        assert_eq!(retrieved.draft().email, "anna@beispiel.ch");
        assert_eq!(storage.len().await.unwrap(), 1);

        storage.delete("session1").await.unwrap();
        assert!(storage.get("session1").await.unwrap().is_none());
    }
}
