//! Hunter - security scan orchestrator
//!
//! Lists the built-in scanners, runs a blocking scan against one target, or
//! submits the same scan as a background job and follows its progress.

mod output;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hunter_common::logging::{LogConfig, LogFormat};
use hunter_common::Config;
use hunter_core::{ScanContext, ScanOptions, Target};
use hunter_engine::{JobManager, JobStatus, Runner, ScannerRegistry};
use output::OutputFormat;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Hunter security scanner
#[derive(Parser, Debug)]
#[command(name = "hunter")]
#[command(version)]
#[command(about = "Run security scanners against a target", long_about = None)]
struct Cli {
    /// Configuration file path (default: ~/.hunter.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available scanners
    List,
    /// Run scanners and wait for the results
    Scan(ScanArgs),
    /// Run scanners as a background job and poll until it finishes
    Submit {
        #[command(flatten)]
        scan: ScanArgs,

        /// Progress poll interval in milliseconds
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Target host, host:port, or URL
    #[arg(short, long)]
    target: Option<String>,

    /// Scanners to run, comma separated (default: all)
    #[arg(short, long, value_delimiter = ',', conflicts_with = "profile")]
    scanners: Vec<String>,

    /// Named scan profile from the config file
    #[arg(short, long)]
    profile: Option<String>,

    /// Maximum scanners running at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-scanner timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Ports for the port scanner (e.g. 22,80,8000-8100 or common)
    #[arg(long)]
    ports: Option<String>,

    /// Output format (table, json)
    #[arg(short, long)]
    output: Option<String>,

    /// Ask scanners for more detailed logging
    #[arg(short, long)]
    verbose: bool,
}

/// A fully resolved scan: flags over env over file over defaults
#[derive(Debug)]
struct ScanPlan {
    target: Target,
    scanners: Vec<String>,
    options: ScanOptions,
    format: OutputFormat,
}

impl ScanArgs {
    fn plan(&self, config: &Config, registry: &ScannerRegistry) -> Result<ScanPlan> {
        let raw_target = self
            .target
            .as_deref()
            .or(config.default_target.as_deref())
            .context("--target is required (or set default_target in the config)")?;
        let target = Target::parse(raw_target)?;

        let scanners = match (&self.profile, self.scanners.is_empty()) {
            (Some(name), _) => match config.profile(name) {
                Some(profile) => profile.scanners.clone(),
                None => bail!("unknown scan profile {:?}", name),
            },
            (None, false) if self.scanners != ["all"] => self.scanners.clone(),
            _ => registry.names(),
        };

        let mut options = config.scan_options()?;
        if let Some(concurrency) = self.concurrency {
            options = options.with_concurrency(concurrency);
        }
        if let Some(secs) = self.timeout {
            let timeout = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid --timeout {}", secs))?;
            options = options.with_timeout(timeout);
        }
        if let Some(ports) = &self.ports {
            options = options.with_extra("ports", ports.as_str());
        }
        if self.verbose {
            options = options.with_verbose(true);
        }

        let format = self
            .output
            .as_deref()
            .unwrap_or(&config.output_format)
            .parse::<OutputFormat>()?;

        Ok(ScanPlan {
            target,
            scanners,
            options,
            format,
        })
    }
}

/// Logging settings from the config file, overridden by the command line
fn log_config(cli: &Cli, config: &Config) -> LogConfig {
    let mut log_config = LogConfig::from(&config.logging);
    if let Some(level) = &cli.log_level {
        log_config = log_config.level(level.clone());
    }
    if let Some(format) = &cli.log_format {
        log_config = log_config.format(LogFormat::parse(format));
    }
    log_config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?.merge_env();

    // Initialize logging
    hunter_common::logging::init_logging_with_config(log_config(&cli, &config));

    let mut registry = ScannerRegistry::new();
    for scanner in hunter_probes::builtin_scanners() {
        registry.register(scanner);
    }
    let registry = Arc::new(registry);

    match cli.command {
        Command::List => {
            for scanner in registry.all() {
                println!("{:<12} {}", scanner.name(), scanner.description());
            }
        }
        Command::Scan(args) => {
            let plan = args.plan(&config, &registry)?;
            run_scan(Runner::new(registry), plan).await?;
        }
        Command::Submit { scan, poll_ms } => {
            let plan = scan.plan(&config, &registry)?;
            let manager = JobManager::new(Arc::new(Runner::new(registry)));
            run_job(&manager, plan, Duration::from_millis(poll_ms.max(1))).await?;
        }
    }

    Ok(())
}

async fn run_scan(runner: Runner, plan: ScanPlan) -> Result<()> {
    let ctx = ScanContext::background();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling scan");
            interrupt.cancel();
        }
    });

    info!(
        "Scanning {} with {} scanners",
        plan.target,
        plan.scanners.len()
    );
    let mut results = runner
        .run_all(&ctx, &plan.scanners, &plan.target, &plan.options)
        .await;
    results.sort_by(|a, b| a.scanner_name.cmp(&b.scanner_name));

    print!(
        "{}",
        output::render(plan.format, &mut results, std::io::stdout().is_terminal())?
    );
    Ok(())
}

async fn run_job(manager: &JobManager, plan: ScanPlan, poll: Duration) -> Result<()> {
    let job = manager
        .create_and_start(plan.target, plan.scanners, plan.options)
        .await?;
    info!("Submitted job {}", job.id);

    let mut reported = usize::MAX;
    let job = loop {
        let snapshot = manager.get(&job.id).await?;
        if snapshot.progress.completed_scanners != reported {
            reported = snapshot.progress.completed_scanners;
            info!(
                "Job {}: {}/{} scanners done ({:.0}%)",
                snapshot.id,
                snapshot.progress.completed_scanners,
                snapshot.progress.total_scanners,
                snapshot.progress.percent()
            );
        }
        if snapshot.is_terminal() {
            break snapshot;
        }
        tokio::select! {
            _ = tokio::time::sleep(poll) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, cancelling job {}", job.id);
                manager.delete(&job.id).await?;
                bail!("job {} cancelled", job.id);
            }
        }
    };

    let mut results = job.results;
    print!(
        "{}",
        output::render(plan.format, &mut results, std::io::stdout().is_terminal())?
    );

    if job.status == JobStatus::Failed {
        bail!(
            "job {} failed: {}",
            job.id,
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
