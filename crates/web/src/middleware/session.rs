//! Session middleware configuration.
//!
//! Sessions live in process memory and end with the browser session; a
//! restart signs everyone out. The store is a bounded moka cache: sessions
//! idle for longer than the configured time are dropped, and once the cache
//! is full the least useful entries are evicted.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::WebConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "staybook_session";

/// Session keys.
pub mod keys {
    /// The signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// The booking being assembled.
    pub const BOOKING_DRAFT: &str = "booking_draft";

    /// Saved hotel IDs of the signed-in user.
    pub const WISHLIST: &str = "wishlist";

    /// The last confirmed booking, shown on the confirmation page.
    pub const LAST_CONFIRMATION: &str = "last_confirmation";
}

/// In-memory session store with a size bound and idle expiry.
#[derive(Debug, Clone)]
pub struct MokaSessionStore {
    cache: Cache<Id, Record>,
}

impl MokaSessionStore {
    /// Hold at most `capacity` sessions, each dropped after `idle` without use.
    #[must_use]
    pub fn new(capacity: u64, idle: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Number of sessions currently held (approximate until pending
    /// maintenance has run).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Whether no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply pending evictions and expirations now.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.cache.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .cache
            .get(session_id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.cache.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer backed by a bounded in-memory store.
#[must_use]
pub fn create_session_layer(config: &WebConfig) -> SessionManagerLayer<MokaSessionStore> {
    let store = MokaSessionStore::new(
        config.session_capacity,
        Duration::from_secs(config.session_idle_minutes.saturating_mul(60)),
    );

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnSessionEnd)
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(expires_in: time::Duration) -> Record {
        Record {
            id: Id::default(),
            data: Default::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    fn store(capacity: u64) -> MokaSessionStore {
        MokaSessionStore::new(capacity, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_create_load_delete() {
        let store = store(100);
        let mut rec = record(time::Duration::minutes(30));
        store.create(&mut rec).await.unwrap();

        assert_eq!(store.load(&rec.id).await.unwrap(), Some(rec.clone()));

        store.delete(&rec.id).await.unwrap();
        assert_eq!(store.load(&rec.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_record_is_not_loaded() {
        let store = store(100);
        let mut rec = record(time::Duration::minutes(-1));
        store.create(&mut rec).await.unwrap();

        assert_eq!(store.load(&rec.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_avoids_id_collision() {
        let store = store(100);
        let mut first = record(time::Duration::minutes(30));
        store.create(&mut first).await.unwrap();

        let mut second = record(time::Duration::minutes(30));
        second.id = first.id;
        store.create(&mut second).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_anonymous_sessions_stay_within_capacity() {
        let store = store(10);
        for _ in 0..200 {
            let mut rec = record(time::Duration::weeks(2));
            store.create(&mut rec).await.unwrap();
        }
        store.run_pending_tasks().await;

        assert!(store.len() <= 10, "held {} sessions", store.len());
    }
}
