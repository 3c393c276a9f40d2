//! Severity levels for findings

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Severity level for findings.
///
/// Ordering follows reporting priority: `Critical` sorts first and any
/// unrecognized label sorts after `Info`. Unknown labels are kept verbatim
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    /// Critical severity, immediate action required
    Critical,
    /// High severity, significant risk
    High,
    /// Medium severity, moderate risk
    Medium,
    /// Low severity, minimal risk
    Low,
    /// Informational finding, no security impact
    #[default]
    Info,
    /// Label produced by a probe that is not one of the known levels
    Unrecognized(String),
}

impl Severity {
    /// Sort rank, lower is more severe
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
            Severity::Unrecognized(_) => 5,
        }
    }

    /// Wire label
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
            Severity::Unrecognized(label) => label,
        }
    }

    /// Parse a wire label. Only the exact upper-case labels are known
    /// levels; anything else is kept as `Unrecognized`. Never fails.
    pub fn parse(label: &str) -> Self {
        match label {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            "LOW" => Severity::Low,
            "INFO" => Severity::Info,
            _ => Severity::Unrecognized(label.to_string()),
        }
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        Severity::parse(&label)
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Unrecognized(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.rank().cmp(&other.rank()) {
            Ordering::Equal => match (self, other) {
                (Severity::Unrecognized(a), Severity::Unrecognized(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
            ord => ord,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
