//! Scan target definitions

use serde::{Deserialize, Serialize};
use url::Url;

/// What to scan.
///
/// Built once (usually via [`Target::parse`]) and shared read-only by every
/// scanner in a batch or job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Hostname or IP address
    pub host: String,

    /// Explicit ports, if the input named any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,

    /// Original URL when the target was given as one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// URL scheme, `https` unless the input said otherwise
    pub scheme: String,
}

impl Target {
    /// Create a target for a bare host
    pub fn host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ports: Vec::new(),
            url: None,
            scheme: String::from("https"),
        }
    }

    /// Add an explicit port
    pub fn with_port(mut self, port: u16) -> Self {
        self.ports.push(port);
        self
    }

    /// Parse a target from a host, `host:port`, or URL
    pub fn parse(raw: &str) -> Result<Self, TargetParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TargetParseError::Empty);
        }

        if raw.contains("://") {
            return Self::parse_url(raw);
        }

        if let Some((host, port)) = split_host_port(raw) {
            let port: u32 = port
                .parse()
                .map_err(|_| TargetParseError::InvalidPort(port.to_string()))?;
            if !(1..=65535).contains(&port) {
                return Err(TargetParseError::PortOutOfRange(port));
            }
            return Ok(Self::host(host).with_port(port as u16));
        }

        Ok(Self::host(raw))
    }

    fn parse_url(raw: &str) -> Result<Self, TargetParseError> {
        let url = Url::parse(raw).map_err(|e| TargetParseError::InvalidUrl(e.to_string()))?;

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.trim_start_matches('[').trim_end_matches(']'),
            _ => return Err(TargetParseError::MissingHost(raw.to_string())),
        };

        let mut target = Self {
            host: host.to_string(),
            ports: Vec::new(),
            url: Some(raw.to_string()),
            scheme: url.scheme().to_string(),
        };
        // `Url::port` hides the scheme default, matching "explicit port only"
        if let Some(port) = url.port() {
            target.ports.push(port);
        }
        Ok(target)
    }

    /// The URL if one was given, otherwise the host
    pub fn display_name(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.host)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Split `host:port` / `[v6]:port`. Bare IPv6 addresses are not split.
fn split_host_port(raw: &str) -> Option<(&str, &str)> {
    if let Some(rest) = raw.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':')?;
        return Some((host, port));
    }

    let (host, port) = raw.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some((host, port))
}

/// Error parsing a scan target
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetParseError {
    #[error("target cannot be empty")]
    Empty,

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("port {0} out of range (1-65535)")]
    PortOutOfRange(u32),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL {0:?} has no hostname")]
    MissingHost(String),
}

impl From<TargetParseError> for crate::Error {
    fn from(err: TargetParseError) -> Self {
        crate::Error::InvalidTarget(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_host() {
        let target = Target::parse("example.com").unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.scheme, "https");
        assert!(target.ports.is_empty());
        assert!(target.url.is_none());
    }

    #[test]
    fn test_parse_host_port() {
        let target = Target::parse("192.168.1.1:8080").unwrap();
        assert_eq!(target.host, "192.168.1.1");
        assert_eq!(target.ports, vec![8080]);
        assert_eq!(target.scheme, "https");
    }

    #[test]
    fn test_parse_url() {
        let target = Target::parse("http://example.com/path").unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.scheme, "http");
        assert_eq!(target.url.as_deref(), Some("http://example.com/path"));
        assert!(target.ports.is_empty());

        let target = Target::parse("https://example.com:9443/api").unwrap();
        assert_eq!(target.ports, vec![9443]);
        assert_eq!(target.display_name(), "https://example.com:9443/api");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Target::parse("   "), Err(TargetParseError::Empty));
        assert!(matches!(
            Target::parse("example.com:abc"),
            Err(TargetParseError::InvalidPort(_))
        ));
        let err = Target::parse("example.com:99999").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_parse_trims_and_keeps_ipv6() {
        let target = Target::parse("  example.com  ").unwrap();
        assert_eq!(target.host, "example.com");

        let target = Target::parse("::1").unwrap();
        assert_eq!(target.host, "::1");
        assert!(target.ports.is_empty());

        let target = Target::parse("[::1]:8443").unwrap();
        assert_eq!(target.host, "::1");
        assert_eq!(target.ports, vec![8443]);
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let json = serde_json::to_value(Target::host("example.com")).unwrap();
        assert_eq!(json, serde_json::json!({"host": "example.com", "scheme": "https"}));
    }
}
