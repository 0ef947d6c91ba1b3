use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dealdb_core::{ProductRecord, SortKey};
use tokio::sync::RwLock;

/// Immutable view of the catalog at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub products: Arc<Vec<ProductRecord>>,
    /// `None` until the first stamp; an unstamped catalog is always stale.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Owner of the current catalog snapshot.
///
/// The product list sits behind an `Arc` so readers hold the lock only long
/// enough to clone the pointer; sorting and copying happen after it is
/// released. [`CatalogStore::replace`] swaps list and timestamp under one
/// write lock, so a reader sees either the old pair or the new one.
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<CatalogSnapshot>,
}

impl CatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sorted copy of the current products.
    pub async fn read(&self, sort: SortKey) -> Vec<ProductRecord> {
        let products = Arc::clone(&self.current.read().await.products);
        let mut copy = products.as_ref().clone();
        sort.apply(&mut copy);
        copy
    }

    /// Atomically publishes a new product list stamped with `timestamp`.
    pub async fn replace(&self, products: Vec<ProductRecord>, timestamp: DateTime<Utc>) {
        let mut current = self.current.write().await;
        *current = CatalogSnapshot {
            products: Arc::new(products),
            last_updated: Some(timestamp),
        };
    }

    /// `true` when `now - last_updated >= ttl`, or when never stamped.
    pub async fn is_stale(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        is_stale_at(self.current.read().await.last_updated, now, ttl)
    }

    /// Checks staleness and, if stale, stamps the catalog with `now` in the
    /// same critical section. Returns `true` for exactly one caller per
    /// staleness window; that caller is expected to run the refresh.
    ///
    /// The products are left untouched, so until the refresh publishes,
    /// readers get the previous list with a fresh timestamp.
    pub async fn claim_if_stale(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        let mut current = self.current.write().await;
        if !is_stale_at(current.last_updated, now, ttl) {
            return false;
        }
        current.last_updated = Some(now);
        true
    }

    /// Returns the current snapshot without copying the product list.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.current.read().await.clone()
    }
}

fn is_stale_at(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
    match last_updated {
        Some(at) => now.signed_duration_since(at) >= ttl,
        None => true,
    }
}
