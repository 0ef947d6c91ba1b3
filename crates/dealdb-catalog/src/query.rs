use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dealdb_core::{ProductRecord, SortKey};
use tokio::task::JoinError;

use crate::refresh::{RefreshCoordinator, RefreshReport};
use crate::store::CatalogSnapshot;

/// Read path for the catalog: refresh-on-stale, then a sorted copy.
#[derive(Clone)]
pub struct CatalogService {
    coordinator: Arc<RefreshCoordinator>,
    ttl: TimeDelta,
}

impl CatalogService {
    /// A `ttl` too large for `chrono` saturates, which disables staleness.
    #[must_use]
    pub fn new(coordinator: Arc<RefreshCoordinator>, ttl: Duration) -> Self {
        Self {
            coordinator,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub async fn list_products(&self, sort: SortKey) -> Vec<ProductRecord> {
        self.list_products_at(Utc::now(), sort).await
    }

    /// Returns the catalog sorted by `sort`, refreshing first if it is stale
    /// at `now`.
    ///
    /// Only the caller that claims the stale window waits for the refresh.
    /// Callers arriving while it runs see the claim's timestamp, treat the
    /// catalog as fresh, and read the previous snapshot.
    pub async fn list_products_at(&self, now: DateTime<Utc>, sort: SortKey) -> Vec<ProductRecord> {
        let store = self.coordinator.store();
        if store.claim_if_stale(now, self.ttl).await {
            tracing::info!(%now, "catalog stale; refreshing before read");
            if let Err(e) = self.spawn_refresh().await {
                tracing::error!(error = %e, "refresh task did not complete");
            }
        }
        store.read(sort).await
    }

    /// Runs a refresh regardless of staleness and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError`] if the refresh task panicked or the runtime shut
    /// down before it finished.
    pub async fn refresh(&self) -> Result<RefreshReport, JoinError> {
        self.spawn_refresh().await
    }

    /// Runs the cycle on its own task. It completes and publishes even if the
    /// caller is dropped.
    async fn spawn_refresh(&self) -> Result<RefreshReport, JoinError> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move { coordinator.refresh().await }).await
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.coordinator.store().snapshot().await
    }
}
