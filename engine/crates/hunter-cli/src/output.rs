//! Result rendering for the command line

use anyhow::{bail, Result};
use colored::Colorize;
use hunter_core::{sort_findings_by_severity, ScanResult, Severity};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => bail!("unsupported output format {:?} (expected table or json)", other),
        }
    }
}

/// Render results, most severe findings first within each result.
/// `color` only affects the table format.
pub fn render(format: OutputFormat, results: &mut [ScanResult], color: bool) -> Result<String> {
    for result in results.iter_mut() {
        sort_findings_by_severity(&mut result.findings);
    }
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&*results)?),
        OutputFormat::Table => Ok(render_table(results, color)),
    }
}

fn render_table(results: &[ScanResult], color: bool) -> String {
    let mut out = String::new();

    for result in results {
        if let Some(err) = result.error.as_deref().filter(|e| !e.is_empty()) {
            let _ = writeln!(out, "\n[{}] Error: {}", result.scanner_name, err);
            if result.findings.is_empty() {
                continue;
            }
        }

        let _ = writeln!(
            out,
            "\n[{}] {} - {} findings",
            result.scanner_name,
            result.target.display_name(),
            result.findings.len()
        );
        if result.findings.is_empty() {
            out.push_str("  No findings.\n");
            continue;
        }

        let _ = writeln!(out, "  {:<10} {:<40} DESCRIPTION", "SEVERITY", "TITLE");
        let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
        for finding in &result.findings {
            *counts.entry(finding.severity.clone()).or_default() += 1;
            let _ = writeln!(
                out,
                "  {} {:<40} {}",
                severity_label(&finding.severity, color),
                finding.title,
                finding.description
            );
        }
        let _ = writeln!(out, "  Summary: {}", summary(&counts));
    }

    out
}

fn severity_label(severity: &Severity, color: bool) -> String {
    let label = format!("{:<10}", severity.as_str());
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.cyan().to_string(),
        Severity::Info => label.white().to_string(),
        Severity::Unrecognized(_) => label,
    }
}

fn summary(counts: &BTreeMap<Severity, usize>) -> String {
    let count = |s: Severity| counts.get(&s).copied().unwrap_or(0);
    let total: usize = counts.values().sum();
    format!(
        "{} findings ({} critical, {} high, {} medium, {} low, {} info)",
        total,
        count(Severity::Critical),
        count(Severity::High),
        count(Severity::Medium),
        count(Severity::Low),
        count(Severity::Info)
    )
}
