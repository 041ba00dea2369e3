//! Recurring daily discovery run.
//!
//! Builds a [`JobScheduler`] with one job on `TOOLRANK_DAILY_SCHEDULE` and
//! keeps it alive until ctrl-c. A run that overlaps one still marked running
//! is refused by the orchestrator.

use std::sync::Arc;

use toolrank_core::RunType;
use toolrank_ingest::{IngestionOrchestrator, RunOptions};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::app::App;

/// # Errors
///
/// Returns an error if the cron expression is invalid or the scheduler
/// cannot start or stop.
pub(crate) async fn run_schedule(app: &App) -> anyhow::Result<()> {
    let cron = app.config.daily_schedule.clone();
    let mut scheduler = build_scheduler(Arc::clone(&app.orchestrator), &cron).await?;
    tracing::info!(cron = %cron, "scheduler started; press ctrl-c to stop");
    println!("scheduled daily runs on `{cron}`; press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

/// Register the daily run and start the scheduler. The returned handle must
/// be kept alive; dropping it stops the job.
async fn build_scheduler(
    orchestrator: Arc<IngestionOrchestrator>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);
        Box::pin(async move {
            tracing::info!("scheduler: starting daily news run");
            let result = orchestrator
                .trigger_run(RunOptions {
                    run_type: RunType::DailyNews,
                    ..RunOptions::default()
                })
                .await;
            tracing::info!(
                run_id = %result.run_id,
                status = %result.status,
                ingested = result.articles_ingested,
                errors = result.errors.len(),
                "scheduler: daily news run finished"
            );
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
