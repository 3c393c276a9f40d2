//! Hunter Engine - scanner registry, bounded runner, and job manager
//!
//! This crate provides:
//! - `ScannerRegistry`: name-keyed index of available scanners
//! - `Runner`: concurrent fan-out of scanners against one target
//! - `JobManager`: asynchronous jobs with progress tracking

pub mod jobs;
pub mod registry;
pub mod runner;

pub use jobs::{Job, JobManager, JobProgress, JobStatus, PreparedScan, ScanRequest};
pub use registry::ScannerRegistry;
pub use runner::Runner;
