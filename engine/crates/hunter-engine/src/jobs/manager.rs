//! Job manager - creates, runs, and tracks asynchronous scan jobs

use super::job::{Job, JobStatus};
use super::request::ScanRequest;
use crate::runner::Runner;
use chrono::Utc;
use hunter_core::{Error, Result, ScanContext, ScanOptions, ScanResult, Target};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Stored state for one job
struct JobEntry {
    job: Job,
    /// Root context of the job's execution; cancelled on delete
    ctx: ScanContext,
}

/// Owns every job and drives each one on its own background task.
///
/// A single lock guards the job map and every mutable field of every job.
/// Callers only ever receive cloned snapshots. There is no cap on how many
/// jobs run at once; inside a job, scanners run one after another so
/// `progress.current_scanner` always names exactly one scanner.
#[derive(Clone)]
pub struct JobManager {
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
    runner: Arc<Runner>,
}

impl JobManager {
    /// Create a job manager backed by the given runner
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            runner,
        }
    }

    /// Names of every scanner the runner's registry knows, sorted
    pub fn scanner_names(&self) -> Vec<String> {
        self.runner.registry().names()
    }

    /// Create a pending job and return a snapshot of it
    pub async fn create(&self, target: Target, scanners: Vec<String>, options: ScanOptions) -> Job {
        let mut jobs = self.jobs.write().await;

        let mut id = Uuid::new_v4().to_string();
        while jobs.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let job = Job::new(id.clone(), target, scanners, options);
        debug!(
            "Created job {} for {} with {} scanners",
            id,
            job.target,
            job.progress.total_scanners
        );
        let snapshot = job.clone();
        jobs.insert(
            id,
            JobEntry {
                job,
                ctx: ScanContext::background(),
            },
        );
        snapshot
    }

    /// Move a pending job to running and launch its background task
    pub async fn start(&self, job_id: &str) -> Result<()> {
        let (ctx, target, scanners, options) = {
            let mut jobs = self.jobs.write().await;
            let entry = jobs.get_mut(job_id).ok_or_else(|| not_found(job_id))?;

            if entry.job.status != JobStatus::Pending {
                return Err(Error::InvalidTransition {
                    id: job_id.to_string(),
                    status: entry.job.status.to_string(),
                });
            }
            entry.job.status = JobStatus::Running;
            entry.job.started_at = Some(Utc::now());

            (
                entry.ctx.clone(),
                entry.job.target.clone(),
                entry.job.scanners.clone(),
                entry.job.options.clone(),
            )
        };

        info!("Starting job {} ({} scanners)", job_id, scanners.len());

        let manager = self.clone();
        let id = job_id.to_string();
        tokio::spawn(async move {
            manager.execute(id, ctx, target, scanners, options).await;
        });
        Ok(())
    }

    /// Create a job and start it immediately
    pub async fn create_and_start(
        &self,
        target: Target,
        scanners: Vec<String>,
        options: ScanOptions,
    ) -> Result<Job> {
        let job = self.create(target, scanners, options).await;
        self.start(&job.id).await?;
        self.get(&job.id).await
    }

    /// Validate a request, then create and start a job for it
    pub async fn submit(&self, request: &ScanRequest) -> Result<Job> {
        let prepared = request.prepare(self.runner.registry())?;
        self.create_and_start(prepared.target, prepared.scanners, prepared.options)
            .await
    }

    /// Snapshot of one job
    pub async fn get(&self, job_id: &str) -> Result<Job> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| not_found(job_id))
    }

    /// Snapshots of all jobs, newest first
    pub async fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.read().await;
        let mut list: Vec<Job> = jobs.values().map(|entry| entry.job.clone()).collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Remove a job. A job that is still running is cancelled: its scanners
    /// see a cancelled context and its task stops at the next scanner.
    pub async fn delete(&self, job_id: &str) -> Result<()> {
        let entry = self
            .jobs
            .write()
            .await
            .remove(job_id)
            .ok_or_else(|| not_found(job_id))?;

        if entry.job.status == JobStatus::Running {
            info!("Cancelling running job {} on delete", job_id);
        }
        entry.ctx.cancel();
        Ok(())
    }

    /// Poll until the job reaches a terminal state, returning the final snapshot
    pub async fn wait(&self, job_id: &str, poll_interval: Duration) -> Result<Job> {
        loop {
            let job = self.get(job_id).await?;
            if job.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Background task body: run the scanners on a supervised task and turn
    /// a panic into a failed job.
    async fn execute(
        self,
        id: String,
        ctx: ScanContext,
        target: Target,
        scanners: Vec<String>,
        options: ScanOptions,
    ) {
        let worker = {
            let manager = self.clone();
            let id = id.clone();
            tokio::spawn(async move {
                manager
                    .run_scanners(&id, &ctx, &target, &scanners, &options)
                    .await;
            })
        };

        let failure = match worker.await {
            Ok(()) => return,
            Err(err) if err.is_panic() => format!("panic: {}", panic_message(err.into_panic())),
            Err(err) => format!("job task aborted: {}", err),
        };

        error!("Job {} failed: {}", id, failure);
        self.update(&id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(failure);
            job.completed_at = Some(Utc::now());
        })
        .await;
    }

    /// Run each scanner in order under the job-wide deadline
    async fn run_scanners(
        &self,
        id: &str,
        ctx: &ScanContext,
        target: &Target,
        scanners: &[String],
        options: &ScanOptions,
    ) {
        let job_ctx = match job_deadline(options.timeout, scanners.len()) {
            Some(budget) => ctx.with_timeout(budget),
            None => ctx.child(),
        };

        for name in scanners {
            let current = name.clone();
            let present = self
                .update(id, |job| job.progress.current_scanner = Some(current))
                .await;
            if !present {
                debug!("Job {} was deleted, stopping", id);
                return;
            }

            let result = match self.runner.run_one(&job_ctx, name, target, options).await {
                Ok(result) => result,
                Err(err) => {
                    warn!("Job {}: scanner {} failed: {}", id, name, err);
                    ScanResult::failed(name.as_str(), target, err)
                }
            };
            if let Some(err) = &result.error {
                debug!("Job {}: scanner {} reported: {}", id, name, err);
            }

            let present = self
                .update(id, |job| {
                    job.results.push(result);
                    if job.progress.completed_scanners < job.progress.total_scanners {
                        job.progress.completed_scanners += 1;
                    }
                })
                .await;
            if !present {
                debug!("Job {} was deleted, stopping", id);
                return;
            }
        }

        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            job.progress.current_scanner = None;
        })
        .await;
        info!("Job {} completed", id);
    }

    /// Apply `f` to the live job under the lock. False if the job is gone.
    async fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(entry) => {
                f(&mut entry.job);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

/// Overall budget for a job: one timeout per scanner plus one of slack.
/// `None` when there is no timeout or the product overflows.
fn job_deadline(timeout: Duration, scanner_count: usize) -> Option<Duration> {
    if timeout.is_zero() {
        return None;
    }
    let slices = u32::try_from(scanner_count.saturating_add(1)).ok()?;
    timeout.checked_mul(slices)
}

fn not_found(job_id: &str) -> Error {
    Error::JobNotFound {
        id: job_id.to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("unknown panic payload")
    }
}
