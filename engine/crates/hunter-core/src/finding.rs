//! Finding definitions - issues discovered during scanning

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One discovered issue or data point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub description: String,
    pub severity: Severity,

    /// What the probe observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// How to fix it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,

    /// Probe-specific key/value details (port, header name, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Finding {
    /// Create a new finding builder
    pub fn builder(title: impl Into<String>) -> FindingBuilder {
        FindingBuilder::new(title)
    }
}

/// Builder for constructing findings
#[derive(Debug)]
pub struct FindingBuilder {
    finding: Finding,
}

impl FindingBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            finding: Finding {
                title: title.into(),
                description: String::new(),
                severity: Severity::Info,
                evidence: None,
                remediation: None,
                metadata: BTreeMap::new(),
            },
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.finding.description = desc.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.finding.severity = severity;
        self
    }

    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.finding.evidence = Some(evidence.into());
        self
    }

    pub fn remediation(mut self, remediation: impl Into<String>) -> Self {
        self.finding.remediation = Some(remediation.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.finding.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Finding {
        self.finding
    }
}

/// Sort findings most severe first. Stable, so equal severities keep probe order.
pub fn sort_findings_by_severity(findings: &mut [Finding]) {
    findings.sort_by(|a, b| a.severity.cmp(&b.severity));
}
