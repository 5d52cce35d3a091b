use tracing::{info, warn};

use crate::services::job_scheduler_service::{JobContext, JobError, JobResult};
use crate::services::updater_service::UpdateOutcome;

/// Runs one incremental update and, when something was merged, publishes the
/// merged table to readers without going back to disk.
///
/// The update lock makes overlapping ticks skip instead of queueing up behind
/// a slow provider.
pub async fn run_incremental_update(context: JobContext) -> Result<JobResult, JobError> {
    let Some(updater) = context.updater.clone() else {
        warn!("Price update job scheduled without an updater, skipping");
        return Ok(JobResult::default());
    };

    let Ok(_guard) = context.update_lock.try_lock() else {
        warn!("Previous price update still running, skipping this tick");
        return Ok(JobResult::default());
    };

    match updater.incremental_update().await? {
        UpdateOutcome::UpToDate { checkpoint } => {
            info!("No new prices after {}", checkpoint);
            Ok(JobResult::default())
        }
        UpdateOutcome::Merged(report) => {
            let processed = report.fetched;
            let failed = report.dropped_rows;
            context.table.replace(report.table);
            info!("Published merged table, checkpoint now {}", report.checkpoint);
            Ok(JobResult {
                items_processed: processed,
                items_failed: failed,
            })
        }
    }
}
