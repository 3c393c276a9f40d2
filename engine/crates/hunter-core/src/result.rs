//! Scan results - the output of one scanner invocation

use crate::finding::Finding;
use crate::target::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of one `Scanner::run` call.
///
/// A populated `error` means the scan ran but failed or was interrupted on
/// the target side. Orchestration failures are `crate::Error` values instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scanner_name: String,
    pub target: Target,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanResult {
    /// Start a result for a scan beginning now
    pub fn begin(scanner_name: impl Into<String>, target: &Target) -> Self {
        let now = Utc::now();
        Self {
            scanner_name: scanner_name.into(),
            target: target.clone(),
            started_at: now,
            completed_at: now,
            findings: Vec::new(),
            error: None,
        }
    }

    /// A result standing in for a scanner that never produced one
    pub fn failed(
        scanner_name: impl Into<String>,
        target: &Target,
        error: impl std::fmt::Display,
    ) -> Self {
        let mut result = Self::begin(scanner_name, target);
        result.error = Some(error.to_string());
        result
    }

    /// Stamp the completion time
    pub fn finish(mut self) -> Self {
        self.completed_at = Utc::now();
        self
    }

    /// Finish with a scan execution failure
    pub fn finish_with_error(mut self, error: impl std::fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self.finish()
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}
