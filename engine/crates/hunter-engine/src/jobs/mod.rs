//! Asynchronous scan jobs

mod job;
mod manager;
mod request;

pub use job::{Job, JobProgress, JobStatus};
pub use manager::JobManager;
pub use request::{PreparedScan, ScanRequest, DEFAULT_CONCURRENCY};
