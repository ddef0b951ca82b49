use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

pub type RelayCallback = Arc<dyn Fn() + Send + Sync>;

/// Registers one relay trigger per cron spec and starts the scheduler.
pub async fn configure_relay_jobs(
    cron_specs: &[String],
    callback: RelayCallback,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    for spec in cron_specs {
        let label = spec.clone();
        let cb = callback.clone();
        let job = Job::new_async(spec.as_str(), move |_id, _l| {
            let cb = cb.clone();
            let cron_label = label.clone();
            Box::pin(async move {
                tracing::info!(target: "scheduler", cron = %cron_label, "scheduled relay triggered");
                cb();
            })
        })?;
        scheduler.add(job).await?;
        tracing::info!(target: "scheduler", cron = %spec, "relay job registered");
    }
    scheduler.start().await?;
    Ok(scheduler)
}
