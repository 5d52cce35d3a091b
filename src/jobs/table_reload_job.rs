use tracing::info;

use crate::services::job_scheduler_service::{JobContext, JobError, JobResult};

/// Reloads the table from disk on the blocking pool and swaps it in.
///
/// Picks up tables written by an updater running outside this process
/// (cron, CI). A failed read leaves the current snapshot in place.
///
/// Shares the update lock with `price_update_job`: a reload that read the file
/// before an in-process merge must not swap in after that merge publishes.
pub async fn reload_price_table(context: JobContext) -> Result<JobResult, JobError> {
    let Ok(_guard) = context.update_lock.clone().try_lock_owned() else {
        info!("Price update in progress, skipping reload");
        return Ok(JobResult::default());
    };

    let table = context.table.clone();
    let count = tokio::task::spawn_blocking(move || table.reload())
        .await
        .map_err(|e| JobError::Join(e.to_string()))??;

    Ok(JobResult {
        items_processed: count,
        items_failed: 0,
    })
}
