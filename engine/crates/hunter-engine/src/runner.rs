//! Runner - bounded concurrent fan-out of scanners against one target

use crate::registry::ScannerRegistry;
use hunter_core::{Result, ScanContext, ScanOptions, ScanResult, Target};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Executes batches of named scanners against a single target.
///
/// `run_all` spawns one task per name up front and admits at most
/// `max(1, opts.concurrency)` of them into `Scanner::run` at a time. Meant
/// for batches of tens of scanners; very large batches would want a fixed
/// worker pool instead of a task per name.
///
/// A panicking scanner is not contained here: the panic is resumed on the
/// caller's task once it is observed. `JobManager` is the layer that
/// isolates panics.
#[derive(Debug, Clone)]
pub struct Runner {
    registry: Arc<ScannerRegistry>,
}

impl Runner {
    /// Create a runner backed by the given registry
    pub fn new(registry: Arc<ScannerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ScannerRegistry> {
        &self.registry
    }

    /// Run every named scanner concurrently and collect one result per name.
    ///
    /// Unknown names, scanners that return `Err`, and scanners still waiting
    /// for a slot when `ctx` is done all become results with `error` set.
    /// Results are in completion order. Returns once every task has finished.
    pub async fn run_all(
        &self,
        ctx: &ScanContext,
        names: &[String],
        target: &Target,
        opts: &ScanOptions,
    ) -> Vec<ScanResult> {
        let gate = Arc::new(Semaphore::new(opts.effective_concurrency()));
        let results = Arc::new(Mutex::new(Vec::with_capacity(names.len())));
        let target = Arc::new(target.clone());
        let opts = Arc::new(opts.clone());
        let mut tasks = JoinSet::new();

        for name in names {
            let scanner = match self.registry.get(name) {
                Ok(scanner) => scanner,
                Err(err) => {
                    warn!("Skipping {}: {}", name, err);
                    results
                        .lock()
                        .await
                        .push(ScanResult::failed(name.as_str(), &target, err));
                    continue;
                }
            };

            let gate = gate.clone();
            let results = results.clone();
            let ctx = ctx.clone();
            let target = target.clone();
            let opts = opts.clone();

            tasks.spawn(async move {
                let name = scanner.name().to_string();

                let permit = tokio::select! {
                    biased;
                    err = ctx.done() => {
                        debug!("Scanner {} not started: {}", name, err);
                        results.lock().await.push(ScanResult::failed(name, &target, err));
                        return;
                    }
                    permit = gate.acquire_owned() => permit,
                };
                let _permit = match permit {
                    Ok(permit) => permit,
                    Err(err) => {
                        results.lock().await.push(ScanResult::failed(name, &target, err));
                        return;
                    }
                };

                debug!("Running scanner {} against {}", name, target);
                let result = match scanner.run(&ctx, &target, &opts).await {
                    Ok(result) => result,
                    Err(err) => {
                        warn!("Scanner {} failed: {}", name, err);
                        ScanResult::failed(name, &target, err)
                    }
                };
                results.lock().await.push(result);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
                warn!("Scanner task ended abnormally: {}", err);
            }
        }

        let mut results = results.lock().await;
        std::mem::take(&mut *results)
    }

    /// Run a single scanner on the caller's task, without the admission gate.
    ///
    /// Only a failed lookup is an error of the runner's own; anything else
    /// is whatever the scanner returned.
    pub async fn run_one(
        &self,
        ctx: &ScanContext,
        name: &str,
        target: &Target,
        opts: &ScanOptions,
    ) -> Result<ScanResult> {
        let scanner = self.registry.get(name)?;
        debug!("Running scanner {} against {}", name, target);
        scanner.run(ctx, target, opts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunter_core::{Error, Finding, Scanner};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockScanner {
        name: String,
        delay: Duration,
        /// keep sleeping even after the context is done
        stubborn: bool,
        calls: AtomicUsize,
    }

    impl MockScanner {
        fn new(name: &str) -> Arc<Self> {
            Self::slow(name, Duration::ZERO)
        }

        fn slow(name: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                delay,
                stubborn: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn stubborn(name: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                delay,
                stubborn: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Scanner for MockScanner {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "mock"
        }

        async fn run(
            &self,
            ctx: &ScanContext,
            target: &Target,
            _opts: &ScanOptions,
        ) -> Result<ScanResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = ScanResult::begin(self.name.as_str(), target);
            if self.stubborn {
                tokio::time::sleep(self.delay).await;
                return Ok(result.finish());
            }
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                err = ctx.done() => return Ok(result.finish_with_error(err)),
            }
            let mut result = result;
            result
                .findings
                .push(Finding::builder(format!("{} finding", self.name)).build());
            Ok(result.finish())
        }
    }

    /// Tracks how many `run` calls overlap
    struct GaugeScanner {
        name: String,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Scanner for GaugeScanner {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "concurrency gauge"
        }

        async fn run(
            &self,
            _ctx: &ScanContext,
            target: &Target,
            _opts: &ScanOptions,
        ) -> Result<ScanResult> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(15)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(ScanResult::begin(self.name.as_str(), target).finish())
        }
    }

    struct FailingScanner;

    #[async_trait::async_trait]
    impl Scanner for FailingScanner {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "always errors"
        }

        async fn run(
            &self,
            _ctx: &ScanContext,
            _target: &Target,
            _opts: &ScanOptions,
        ) -> Result<ScanResult> {
            Err(Error::InvalidOption {
                key: "ports".into(),
                message: "bad spec".into(),
            })
        }
    }

    struct PanickingScanner;

    #[async_trait::async_trait]
    impl Scanner for PanickingScanner {
        fn name(&self) -> &str {
            "panicky"
        }

        fn description(&self) -> &str {
            "panics"
        }

        async fn run(
            &self,
            _ctx: &ScanContext,
            _target: &Target,
            _opts: &ScanOptions,
        ) -> Result<ScanResult> {
            panic!("scanner exploded");
        }
    }

    fn runner_with(scanners: Vec<Arc<dyn Scanner>>) -> Runner {
        let mut registry = ScannerRegistry::new();
        for scanner in scanners {
            registry.register(scanner);
        }
        Runner::new(Arc::new(registry))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn target() -> Target {
        Target::host("localhost")
    }

    #[tokio::test]
    async fn test_run_all() {
        let runner = runner_with(vec![MockScanner::new("s1"), MockScanner::new("s2")]);
        let opts = ScanOptions::default().with_concurrency(2);

        let results = runner
            .run_all(&ScanContext::background(), &names(&["s1", "s2"]), &target(), &opts)
            .await;

        assert_eq!(results.len(), 2);
        let seen: HashSet<_> = results.iter().map(|r| r.scanner_name.as_str()).collect();
        assert_eq!(seen, HashSet::from(["s1", "s2"]));
        assert!(results.iter().all(|r| !r.findings.is_empty()));
        assert!(results.iter().all(|r| r.error.is_none()));
    }

    #[tokio::test]
    async fn test_run_all_one_result_per_name_at_any_concurrency() {
        let all = ["a", "b", "c", "d", "e"];
        let runner = runner_with(all.iter().map(|n| MockScanner::new(n) as Arc<dyn Scanner>).collect());
        let mut requested = names(&all);
        requested.push("ghost".into());
        let n = requested.len();

        for concurrency in [1, n, n + 10] {
            let opts = ScanOptions::default().with_concurrency(concurrency);
            let results = runner
                .run_all(&ScanContext::background(), &requested, &target(), &opts)
                .await;
            assert_eq!(results.len(), n, "concurrency {}", concurrency);
            let errors = results.iter().filter(|r| r.is_error()).count();
            assert_eq!(errors, 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_all_respects_concurrency_bound() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let scanners: Vec<Arc<dyn Scanner>> = (0..12)
            .map(|i| {
                Arc::new(GaugeScanner {
                    name: format!("g{}", i),
                    active: active.clone(),
                    peak: peak.clone(),
                }) as Arc<dyn Scanner>
            })
            .collect();
        let requested: Vec<String> = (0..12).map(|i| format!("g{}", i)).collect();
        let runner = runner_with(scanners);

        for bound in [0usize, 1, 3] {
            peak.store(0, Ordering::SeqCst);
            let opts = ScanOptions::default().with_concurrency(bound);
            let results = runner
                .run_all(&ScanContext::background(), &requested, &target(), &opts)
                .await;
            assert_eq!(results.len(), 12);
            let observed = peak.load(Ordering::SeqCst);
            assert!(observed >= 1);
            assert!(observed <= bound.max(1), "peak {} > bound {}", observed, bound);
        }
    }

    #[tokio::test]
    async fn test_run_all_unknown_scanner() {
        let runner = runner_with(vec![]);
        let results = runner
            .run_all(
                &ScanContext::background(),
                &names(&["unknown"]),
                &target(),
                &ScanOptions::default(),
            )
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].scanner_name, "unknown");
        assert!(results[0].error.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_run_all_precancelled_context_skips_scanners() {
        let scanner = MockScanner::new("x");
        let runner = runner_with(vec![scanner.clone()]);
        let ctx = ScanContext::background();
        ctx.cancel();

        let results = runner
            .run_all(&ctx, &names(&["x"]), &target(), &ScanOptions::default())
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error.as_deref(), Some("context canceled"));
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_all_deadline_while_waiting_for_slot() {
        let holder = MockScanner::stubborn("holder", Duration::from_millis(200));
        let waiter = MockScanner::new("waiter");
        let runner = runner_with(vec![holder.clone(), waiter.clone()]);
        let ctx = ScanContext::background().with_timeout(Duration::from_millis(50));
        let opts = ScanOptions::default().with_concurrency(1);

        // "holder" is spawned first and takes the only slot
        let results = runner
            .run_all(&ctx, &names(&["holder", "waiter"]), &target(), &opts)
            .await;

        assert_eq!(results.len(), 2);
        let waited = results.iter().find(|r| r.scanner_name == "waiter").unwrap();
        assert_eq!(waited.error.as_deref(), Some("context deadline exceeded"));
        assert_eq!(waiter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(holder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_all_scanner_error_becomes_result() {
        let runner = runner_with(vec![Arc::new(FailingScanner), MockScanner::new("ok")]);
        let results = runner
            .run_all(
                &ScanContext::background(),
                &names(&["failing", "ok"]),
                &target(),
                &ScanOptions::default(),
            )
            .await;

        assert_eq!(results.len(), 2);
        let failed = results.iter().find(|r| r.scanner_name == "failing").unwrap();
        assert!(failed.error.as_deref().unwrap().contains("bad spec"));
        let ok = results.iter().find(|r| r.scanner_name == "ok").unwrap();
        assert!(ok.error.is_none());
    }

    #[tokio::test]
    #[should_panic(expected = "scanner exploded")]
    async fn test_run_all_does_not_contain_panics() {
        let runner = runner_with(vec![Arc::new(PanickingScanner)]);
        runner
            .run_all(
                &ScanContext::background(),
                &names(&["panicky"]),
                &target(),
                &ScanOptions::default(),
            )
            .await;
    }

    #[tokio::test]
    async fn test_run_one() {
        let runner = runner_with(vec![MockScanner::new("test")]);
        let result = runner
            .run_one(&ScanContext::background(), "test", &target(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(result.scanner_name, "test");
        assert_eq!(result.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_run_one_not_found() {
        let runner = runner_with(vec![]);
        let err = runner
            .run_one(&ScanContext::background(), "nope", &target(), &ScanOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_run_one_keeps_scan_error_in_result() {
        let runner = runner_with(vec![MockScanner::slow("slow", Duration::from_secs(5))]);
        let ctx = ScanContext::background().with_timeout(Duration::from_millis(20));
        let result = runner
            .run_one(&ctx, "slow", &target(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(result.error.as_deref(), Some("context deadline exceeded"));
    }
}
