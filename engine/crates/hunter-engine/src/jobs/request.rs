//! Scan request validation for network-facing callers

use crate::registry::ScannerRegistry;
use hunter_core::{Error, Result, ScanOptions, Target};
use serde::{Deserialize, Serialize};

/// Default concurrency when a request leaves it at zero
pub const DEFAULT_CONCURRENCY: i64 = 10;

/// Body of a "create scan" request, as a web layer would decode it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub target: String,

    /// Scanner names; empty or `["all"]` selects every registered scanner
    #[serde(default)]
    pub scanners: Vec<String>,

    /// 0 selects the default, negative is rejected
    #[serde(default)]
    pub concurrency: i64,

    /// Per-scanner timeout as a duration string such as "30s" or "1500ms";
    /// empty keeps the default
    #[serde(default)]
    pub timeout: String,
}

/// A validated request, ready for `JobManager::create`
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedScan {
    pub target: Target,
    pub scanners: Vec<String>,
    pub options: ScanOptions,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_scanners(mut self, scanners: Vec<String>) -> Self {
        self.scanners = scanners;
        self
    }

    /// Validate the request and expand the scanner selection.
    ///
    /// Unknown scanner names are kept: they surface as failed results when
    /// the job runs, the same way the runner treats them.
    pub fn prepare(&self, registry: &ScannerRegistry) -> Result<PreparedScan> {
        if self.target.trim().is_empty() {
            return Err(Error::InvalidRequest("target is required".into()));
        }
        if self.concurrency < 0 {
            return Err(Error::InvalidRequest(
                "concurrency must be non-negative".into(),
            ));
        }

        let target = Target::parse(&self.target)?;

        let concurrency = if self.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            self.concurrency
        };
        let mut options = ScanOptions::default()
            .with_concurrency(usize::try_from(concurrency).unwrap_or(usize::MAX));

        let timeout = self.timeout.trim();
        if !timeout.is_empty() {
            let timeout = humantime::parse_duration(timeout).map_err(|e| {
                Error::InvalidRequest(format!("invalid timeout {:?}: {}", self.timeout, e))
            })?;
            options = options.with_timeout(timeout);
        }

        let select_all = self.scanners.is_empty()
            || (self.scanners.len() == 1 && self.scanners[0] == "all");
        let scanners = if select_all {
            registry.names()
        } else {
            self.scanners.clone()
        };

        Ok(PreparedScan {
            target,
            scanners,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunter_core::{ScanContext, ScanResult, Scanner};
    use std::sync::Arc;
    use std::time::Duration;

    struct Named(&'static str);

    #[async_trait::async_trait]
    impl Scanner for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "named"
        }

        async fn run(
            &self,
            _ctx: &ScanContext,
            target: &Target,
            _opts: &ScanOptions,
        ) -> Result<ScanResult> {
            Ok(ScanResult::begin(self.0, target).finish())
        }
    }

    fn registry() -> ScannerRegistry {
        let mut registry = ScannerRegistry::new();
        registry.register(Arc::new(Named("port")));
        registry.register(Arc::new(Named("headers")));
        registry
    }

    #[test]
    fn test_defaults_and_all_expansion() {
        let prepared = ScanRequest::new("example.com").prepare(&registry()).unwrap();
        assert_eq!(prepared.target.host, "example.com");
        assert_eq!(prepared.scanners, vec!["headers", "port"]);
        assert_eq!(prepared.options.concurrency, 10);
        assert_eq!(prepared.options.timeout, Duration::from_secs(5));

        let prepared = ScanRequest::new("example.com")
            .with_scanners(vec!["all".into()])
            .prepare(&registry())
            .unwrap();
        assert_eq!(prepared.scanners.len(), 2);
    }

    #[test]
    fn test_explicit_selection_and_timeout() {
        let request = ScanRequest {
            target: "https://example.com:8443".into(),
            scanners: vec!["port".into(), "ghost".into()],
            concurrency: 3,
            timeout: "1500ms".into(),
        };
        let prepared = request.prepare(&registry()).unwrap();
        assert_eq!(prepared.scanners, vec!["port", "ghost"]);
        assert_eq!(prepared.options.concurrency, 3);
        assert_eq!(prepared.options.timeout, Duration::from_millis(1500));
        assert_eq!(prepared.target.ports, vec![8443]);
    }

    #[test]
    fn test_decodes_web_request_body() {
        let body = r#"{"target":"example.com","scanners":["port"],"concurrency":0,"timeout":"30s"}"#;
        let request: ScanRequest = serde_json::from_str(body).unwrap();
        let prepared = request.prepare(&registry()).unwrap();
        assert_eq!(prepared.options.timeout, Duration::from_secs(30));
        assert_eq!(prepared.options.concurrency, 10);

        let request: ScanRequest = serde_json::from_str(r#"{"target":"example.com"}"#).unwrap();
        assert_eq!(
            request.prepare(&registry()).unwrap().options.timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_rejects_invalid_requests() {
        let err = ScanRequest::new("").prepare(&registry()).unwrap_err();
        assert!(err.to_string().contains("target is required"));

        let request = ScanRequest {
            concurrency: -1,
            ..ScanRequest::new("example.com")
        };
        assert!(matches!(
            request.prepare(&registry()),
            Err(Error::InvalidRequest(_))
        ));

        let request = ScanRequest {
            timeout: "soon".into(),
            ..ScanRequest::new("example.com")
        };
        let err = request.prepare(&registry()).unwrap_err();
        assert!(err.to_string().contains("invalid timeout \"soon\""));

        let err = ScanRequest::new("example.com:0").prepare(&registry()).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));
        assert!(err.is_client_error());
    }
}
