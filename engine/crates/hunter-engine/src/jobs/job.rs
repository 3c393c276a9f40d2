//! Job model - a trackable asynchronous scan request

use chrono::{DateTime, Utc};
use hunter_core::{ScanOptions, ScanResult, Target};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job.
///
/// `Pending -> Running -> Completed`, or `Running -> Failed` when the
/// execution task panics. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scanner-level progress within a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub total_scanners: usize,
    /// Only ever increases, never past `total_scanners`
    pub completed_scanners: usize,
    /// Scanner currently executing; cleared when the job completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_scanner: Option<String>,
}

impl JobProgress {
    pub fn new(total_scanners: usize) -> Self {
        Self {
            total_scanners,
            completed_scanners: 0,
            current_scanner: None,
        }
    }

    /// Completion as a percentage; an empty job counts as done
    pub fn percent(&self) -> f64 {
        if self.total_scanners == 0 {
            return 100.0;
        }
        self.completed_scanners as f64 * 100.0 / self.total_scanners as f64
    }
}

/// An asynchronous scan job.
///
/// Values handed out by `JobManager` are snapshots; the live copy is only
/// touched under the manager's lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub target: Target,
    pub scanners: Vec<String>,
    #[serde(skip)]
    pub options: ScanOptions,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ScanResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: JobProgress,
}

impl Job {
    pub(crate) fn new(id: String, target: Target, scanners: Vec<String>, options: ScanOptions) -> Self {
        let progress = JobProgress::new(scanners.len());
        Self {
            id,
            target,
            scanners,
            options,
            status: JobStatus::Pending,
            results: Vec::new(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            progress,
        }
    }

    /// Total findings across all results
    pub fn finding_count(&self) -> usize {
        self.results.iter().map(|r| r.findings.len()).sum()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
