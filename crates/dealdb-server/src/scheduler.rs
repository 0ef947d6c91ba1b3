//! Background job scheduler.
//!
//! Optional periodic refresh on top of the refresh-on-read path. The job goes
//! through the same coordinator, so it queues behind any in-flight refresh.

use dealdb_catalog::CatalogService;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// When `refresh_cron` is `None` the scheduler runs with no jobs. Returns the
/// running [`JobScheduler`] handle, which must be kept alive for the lifetime
/// of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    catalog: CatalogService,
    refresh_cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if let Some(cron) = refresh_cron {
        register_refresh_job(&scheduler, catalog, cron).await?;
        tracing::info!(cron, "scheduler: background catalog refresh enabled");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_refresh_job(
    scheduler: &JobScheduler,
    catalog: CatalogService,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let catalog = catalog.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting catalog refresh");
            match catalog.refresh().await {
                Ok(report) => tracing::info!(
                    products = report.products,
                    failed = report.failed,
                    "scheduler: catalog refresh complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: catalog refresh task failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
