//! Background Jobs Module
//!
//! Jobs registered with the job scheduler service. They run inside the server
//! process, independently of requests.
//!
//! # Available Jobs
//!
//! - `table_reload_job` - Rereads the persisted table and swaps it into the
//!   request-serving handle
//! - `price_update_job` - Runs an incremental update and publishes the merged
//!   table on success
//!
//! Both jobs are safe to re-run: a reload is a pure read, and an update with no
//! new trading days is a no-op.

pub mod price_update_job;
pub mod table_reload_job;
