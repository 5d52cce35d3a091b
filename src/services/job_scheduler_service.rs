use crate::config::AppConfig;
use crate::errors::UpdateError;
use crate::jobs::{price_update_job, table_reload_job};
use crate::services::table_handle::TableHandle;
use crate::services::updater_service::UpdaterService;
use crate::store::StoreError;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub table: Arc<TableHandle>,
    pub updater: Option<Arc<UpdaterService>>,
    pub update_lock: Arc<Mutex<()>>,
}

impl JobContext {
    pub fn new(table: Arc<TableHandle>, updater: Option<Arc<UpdaterService>>) -> Self {
        Self {
            table,
            updater,
            update_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("job task panicked or was cancelled: {0}")]
    Join(String),
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

#[derive(Debug, Default)]
pub struct JobResult {
    pub items_processed: usize,
    pub items_failed: usize,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, JobError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| JobError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Registers the jobs enabled in `config` and starts the scheduler.
    /// Returns the number of scheduled jobs.
    pub async fn start(&mut self, config: &AppConfig) -> Result<usize, JobError> {
        info!("🚀 Starting job scheduler...");
        let mut scheduled = 0;

        if let Some(schedule) = config.table_reload_schedule.as_deref() {
            self.schedule_job(
                schedule,
                "reload_price_table",
                "Reload persisted price table",
                table_reload_job::reload_price_table,
            )
            .await?;
            scheduled += 1;
        }

        if let Some(schedule) = config.update_schedule.as_deref() {
            if self.context.updater.is_some() {
                self.schedule_job(
                    schedule,
                    "incremental_price_update",
                    "Fetch and merge new daily prices",
                    price_update_job::run_incremental_update,
                )
                .await?;
                scheduled += 1;
            }
        }

        self.scheduler
            .start()
            .await
            .map_err(|e| JobError::Scheduler(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started with {} jobs", scheduled);
        Ok(scheduled)
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), JobError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| JobError::Scheduler(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), JobError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, JobError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| JobError::Scheduler(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| JobError::Scheduler(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

async fn execute_job_with_tracking<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, JobError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );
        }
        Err(e) => {
            error!("❌ Job failed: {} - {} (duration: {}ms)", job_name, e, duration_ms);
        }
    }
}
