//! Catalog connection pool.
//!
//! Sessions to the external catalog are keyed by connection config. A
//! lease grants exclusive use of one session; concurrent sink dispatches
//! wanting the same session wait for the current holder. Dropping the
//! lease releases the slot, so release happens regardless of how a sink
//! dispatch ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use courier_core::model::ConnectionConfig;
use courier_core::traits::{CatalogSession, SessionFactory};
use courier_core::{AppError, AppResult};

type Slot = Arc<AsyncMutex<Arc<dyn CatalogSession>>>;

/// Pools catalog sessions per connection config.
#[derive(Debug)]
pub struct ConnectionManager {
    factory: Arc<dyn SessionFactory>,
    slots: Mutex<HashMap<String, Slot>>,
}

/// Exclusive lease on one pooled session. Released on drop.
#[derive(Debug)]
pub struct Lease {
    guard: OwnedMutexGuard<Arc<dyn CatalogSession>>,
}

impl Lease {
    /// The leased session.
    pub fn session(&self) -> &Arc<dyn CatalogSession> {
        &self.guard
    }
}

impl ConnectionManager {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Lease a session for the first usable connection config.
    ///
    /// Opens a new session when the pool has no slot for the config yet;
    /// otherwise waits until the existing slot is free.
    pub async fn lease(&self, configs: &[ConnectionConfig]) -> AppResult<Lease> {
        let config = configs
            .first()
            .ok_or_else(|| AppError::configuration("No connection is configured."))?;
        let key = config.pool_key();

        let existing = self.slots().get(&key).cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                debug!("Opening a new catalog session for '{key}'");
                let session = self.factory.open(config).await?;
                let slot: Slot = Arc::new(AsyncMutex::new(session));
                // Another dispatch may have raced the open; keep the first.
                self.slots()
                    .entry(key)
                    .or_insert_with(|| slot.clone())
                    .clone()
            }
        };

        let guard = slot.lock_owned().await;
        Ok(Lease { guard })
    }

    /// Number of slots currently held by a lease.
    pub fn active_leases(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.try_lock().is_err())
            .count()
    }

    /// Number of pooled slots.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// Whether the pool holds no slot.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pooled slot. Called unconditionally at run end so no
    /// session outlives its run.
    pub fn release_all(&self) {
        let mut slots = self.slots();
        if !slots.is_empty() {
            info!("Releasing {} pooled catalog session(s)", slots.len());
        }
        slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use courier_core::traits::{
        ContentUpload, HubContent, HubRepository, LibraryPathResolver,
    };
    use uuid::Uuid;

    #[derive(Debug)]
    struct NullSession;

    #[async_trait]
    impl LibraryPathResolver for NullSession {
        async fn resolve_library_path(&self, target: &str) -> AppResult<String> {
            Ok(target.to_string())
        }
    }

    #[async_trait]
    impl HubRepository for NullSession {
        async fn find(&self, _: &str, _: Option<&str>) -> AppResult<Vec<HubContent>> {
            Ok(Vec::new())
        }
        async fn list_all(&self) -> AppResult<Vec<HubContent>> {
            Ok(Vec::new())
        }
        async fn create(&self, _: ContentUpload) -> AppResult<HubContent> {
            Err(AppError::internal("not supported"))
        }
        async fn update(&self, _: Uuid, _: ContentUpload) -> AppResult<HubContent> {
            Err(AppError::internal("not supported"))
        }
        async fn change_owner(&self, _: Uuid, _: &str) -> AppResult<HubContent> {
            Err(AppError::internal("not supported"))
        }
        async fn delete(&self, _: Uuid) -> AppResult<()> {
            Ok(())
        }
        async fn lookup_user_id(&self, _: &str) -> AppResult<Uuid> {
            Ok(Uuid::new_v4())
        }
        fn base_url(&self) -> String {
            String::new()
        }
    }

    #[derive(Debug, Default)]
    struct CountingFactory {
        opened: AtomicUsize,
    }

    #[async_trait]
    impl SessionFactory for CountingFactory {
        async fn open(&self, _: &ConnectionConfig) -> AppResult<Arc<dyn CatalogSession>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullSession))
        }
    }

    fn config(uri: &str) -> ConnectionConfig {
        ConnectionConfig {
            server_uri: uri.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_same_config_reuses_one_session() {
        let factory = Arc::new(CountingFactory::default());
        let pool = ConnectionManager::new(factory.clone());

        {
            let _lease = pool.lease(&[config("https://a")]).await.unwrap();
        }
        {
            let _lease = pool.lease(&[config("https://a")]).await.unwrap();
        }

        assert_eq!(factory.opened.load(Ordering::SeqCst), 1);
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_lease_is_exclusive_until_dropped() {
        let pool = ConnectionManager::new(Arc::new(CountingFactory::default()));

        let lease = pool.lease(&[config("https://a")]).await.unwrap();
        assert_eq!(pool.active_leases(), 1);

        drop(lease);
        assert_eq!(pool.active_leases(), 0);
    }

    #[tokio::test]
    async fn test_release_all_empties_the_pool() {
        let pool = ConnectionManager::new(Arc::new(CountingFactory::default()));
        {
            let _a = pool.lease(&[config("https://a")]).await.unwrap();
            let _b = pool.lease(&[config("https://b")]).await.unwrap();
        }
        assert_eq!(pool.len(), 2);

        pool.release_all();

        assert!(pool.is_empty());
        assert_eq!(pool.active_leases(), 0);
    }

    #[tokio::test]
    async fn test_no_configs_is_a_configuration_error() {
        let pool = ConnectionManager::new(Arc::new(CountingFactory::default()));
        let err = pool.lease(&[]).await.unwrap_err();
        assert_eq!(err.kind, courier_core::error::ErrorKind::Configuration);
    }
}
