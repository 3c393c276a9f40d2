//! Scanner trait and run options - the interface every probe implements

use crate::context::ScanContext;
use crate::error::{Error, Result};
use crate::result::ScanResult;
use crate::target::Target;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// The trait that all probes must implement.
///
/// One instance is shared by every caller through the registry, so `run`
/// must tolerate concurrent calls with different targets and options.
#[async_trait::async_trait]
pub trait Scanner: Send + Sync {
    /// Stable unique name; the registry key and the public identifier
    fn name(&self) -> &str;

    /// One-line human description
    fn description(&self) -> &str;

    /// Scan `target`.
    ///
    /// Return `Err` only when the scan could not be attempted at all (bad
    /// options, request cannot be built). Target-side failures, including
    /// `ctx` expiring mid-scan, belong in `ScanResult::error` with `Ok`.
    /// Once `ctx.err()` is `Some`, stop starting new network work and
    /// return what has been gathered.
    async fn run(&self, ctx: &ScanContext, target: &Target, opts: &ScanOptions)
        -> Result<ScanResult>;
}

/// Per-run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Upper bound on simultaneously running work (runner gate, probe fan-out)
    pub concurrency: usize,

    /// Per-operation timeout; jobs scale it by scanner count
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    #[serde(default)]
    pub verbose: bool,

    /// Scanner-specific knobs, passed through untouched
    #[serde(default)]
    pub extra_args: ExtraArgs,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(5),
            verbose: false,
            extra_args: ExtraArgs::default(),
        }
    }
}

impl ScanOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_args.insert(key, value);
        self
    }

    /// Concurrency clamped to at least one
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Open bag of scanner-specific arguments.
///
/// The engine never reads it. Each scanner pulls the keys it knows through
/// the typed accessors and ignores the rest; a key present with the wrong
/// type is an [`Error::InvalidOption`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraArgs(HashMap<String, Value>);

impl ExtraArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(invalid(key, "a string", other)),
        }
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| invalid(key, "an unsigned integer", v)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(invalid(key, "a boolean", other)),
        }
    }

    /// Deserialize a key into a scanner's own config type
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| Error::InvalidOption {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }
}

impl FromIterator<(String, Value)> for ExtraArgs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn invalid(key: &str, expected: &str, got: &Value) -> Error {
    Error::InvalidOption {
        key: key.to_string(),
        message: format!("expected {}, got {}", expected, got),
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
