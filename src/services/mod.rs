pub mod job_scheduler_service;
pub mod query_service;
pub mod table_handle;
pub mod updater_service;
