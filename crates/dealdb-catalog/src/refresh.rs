use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dealdb_core::{ProductRecord, UpstreamSource};
use dealdb_scraper::{ScraperError, UpstreamClient};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::merge::merge_sources;
use crate::store::CatalogStore;

/// What one source contributed to a refresh cycle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Fetched {
        source: String,
        products: usize,
    },
    Failed {
        source: String,
        kind: &'static str,
        error: String,
    },
}

impl SourceOutcome {
    #[must_use]
    pub fn is_fetched(&self) -> bool {
        matches!(self, SourceOutcome::Fetched { .. })
    }
}

/// Summary of one completed refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub refreshed_at: DateTime<Utc>,
    pub sources: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Products published after de-duplication.
    pub products: usize,
    pub duplicates_dropped: usize,
    pub elapsed_ms: u64,
    pub outcomes: Vec<SourceOutcome>,
}

impl RefreshReport {
    /// `true` when there was at least one source and none of them succeeded.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.sources > 0 && self.succeeded == 0
    }
}

/// Drives refresh cycles: fan out to every source, join, merge, publish.
///
/// Cycles are serialized by an async mutex. A trigger that arrives while a
/// cycle is running waits for it, then runs its own cycle; it never reuses
/// the earlier result.
pub struct RefreshCoordinator {
    client: UpstreamClient,
    sources: Vec<UpstreamSource>,
    store: Arc<CatalogStore>,
    in_flight: Mutex<()>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        client: UpstreamClient,
        sources: Vec<UpstreamSource>,
        store: Arc<CatalogStore>,
    ) -> Self {
        Self {
            client,
            sources,
            store,
            in_flight: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    #[must_use]
    pub fn sources(&self) -> &[UpstreamSource] {
        &self.sources
    }

    /// Runs one full refresh cycle and publishes the merged result.
    ///
    /// Never fails: each source's error is captured in the report. When every
    /// source fails the catalog is replaced with an empty list.
    pub async fn refresh(&self) -> RefreshReport {
        let _in_flight = self.in_flight.lock().await;
        let started = Instant::now();

        tracing::info!(sources = self.sources.len(), "refresh: fetching upstream sources");

        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let client = self.client.clone();
                let source = source.clone();
                tokio::spawn(async move { client.fetch_products(&source).await })
            })
            .collect();

        // join_all keeps input order, which is registration order.
        let joined = futures::future::join_all(handles).await;

        let mut outcomes = Vec::with_capacity(self.sources.len());
        let mut lists: Vec<Vec<ProductRecord>> = Vec::with_capacity(self.sources.len());

        for (source, result) in self.sources.iter().zip(joined) {
            match result {
                Ok(Ok(products)) => {
                    tracing::debug!(
                        source = %source.name,
                        count = products.len(),
                        "refresh: source fetched"
                    );
                    outcomes.push(SourceOutcome::Fetched {
                        source: source.name.clone(),
                        products: products.len(),
                    });
                    lists.push(products);
                }
                Ok(Err(e)) => outcomes.push(failed_outcome(source, &e)),
                Err(join_err) => {
                    tracing::error!(
                        source = %source.name,
                        error = %join_err,
                        "refresh: fetch task aborted"
                    );
                    outcomes.push(SourceOutcome::Failed {
                        source: source.name.clone(),
                        kind: "task",
                        error: join_err.to_string(),
                    });
                }
            }
        }

        let merged = merge_sources(lists);
        let refreshed_at = Utc::now();
        let product_count = merged.products.len();
        self.store.replace(merged.products, refreshed_at).await;

        let succeeded = outcomes.iter().filter(|o| o.is_fetched()).count();
        let report = RefreshReport {
            refreshed_at,
            sources: self.sources.len(),
            succeeded,
            failed: self.sources.len() - succeeded,
            products: product_count,
            duplicates_dropped: merged.duplicates_dropped,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            outcomes,
        };

        if report.all_failed() {
            tracing::error!(
                sources = report.sources,
                "refresh: every upstream source failed; published an empty catalog"
            );
        } else {
            tracing::info!(
                succeeded = report.succeeded,
                failed = report.failed,
                products = report.products,
                duplicates_dropped = report.duplicates_dropped,
                elapsed_ms = report.elapsed_ms,
                "refresh: catalog published"
            );
        }

        report
    }
}

fn failed_outcome(source: &UpstreamSource, err: &ScraperError) -> SourceOutcome {
    tracing::warn!(
        source = %source.name,
        url = %source.url,
        kind = err.kind(),
        error = %err,
        "refresh: source failed; contributing no products"
    );
    SourceOutcome::Failed {
        source: source.name.clone(),
        kind: err.kind(),
        error: err.to_string(),
    }
}
