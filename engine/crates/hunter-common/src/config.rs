//! Configuration management for Hunter binaries

use hunter_core::{Error, Result, ScanOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File name of the per-user configuration, looked up in the home directory
pub const CONFIG_FILE_NAME: &str = ".hunter.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Target used when none is given on the command line
    #[serde(default)]
    pub default_target: Option<String>,

    /// Result output format (table, json)
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Scanner settings
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Named scanner selections
    #[serde(default)]
    pub scan_profiles: Vec<ScanProfile>,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_output_format() -> String {
    String::from("table")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_target: None,
            output_format: default_output_format(),
            scanner: ScannerConfig::default(),
            scan_profiles: vec![],
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load from `path` if given, otherwise from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.is_file() => Self::from_file(path),
                _ => {
                    debug!("Config file not found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Merge with environment variables (HUNTER_ prefix)
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    /// Values that fail to parse are ignored.
    pub fn merge_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("HUNTER_DEFAULT_TARGET") {
            self.default_target = Some(val);
        }
        if let Some(val) = lookup("HUNTER_OUTPUT_FORMAT") {
            self.output_format = val;
        }

        // Scanner settings
        if let Some(val) = lookup("HUNTER_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                self.scanner.concurrency = n;
            }
        }
        if let Some(val) = lookup("HUNTER_TIMEOUT_SECONDS") {
            if let Ok(secs) = val.parse::<f64>() {
                if secs.is_finite() && secs >= 0.0 {
                    self.scanner.timeout_seconds = secs;
                }
            }
        }
        if let Some(val) = lookup("HUNTER_WORDLIST_PATH") {
            self.scanner.wordlist_path = Some(val);
        }

        // Logging
        if let Some(val) = lookup("HUNTER_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("HUNTER_LOG_FORMAT") {
            self.logging.format = val;
        }

        self
    }

    /// Scan profile with the given name
    pub fn profile(&self, name: &str) -> Option<&ScanProfile> {
        self.scan_profiles.iter().find(|p| p.name == name)
    }

    /// Scan options built from the scanner section
    pub fn scan_options(&self) -> Result<ScanOptions> {
        let mut options = ScanOptions::default()
            .with_concurrency(self.scanner.concurrency)
            .with_timeout(self.scanner.timeout()?);
        if let Some(path) = &self.scanner.wordlist_path {
            options = options.with_extra("wordlist", path.as_str());
        }
        Ok(options)
    }
}

/// Default config file location (`~/.hunter.toml`)
pub fn default_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
}

/// Scanner-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum scanners running at once within one scan
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-scanner timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,

    /// Wordlist handed to scanners that brute-force paths
    pub wordlist_path: Option<String>,
}

fn default_concurrency() -> usize {
    10
}

fn default_timeout() -> f64 {
    5.0
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_seconds: default_timeout(),
            wordlist_path: None,
        }
    }
}

impl ScannerConfig {
    pub fn timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout_seconds).map_err(|e| {
            Error::Configuration(format!(
                "Invalid scanner timeout {}: {}",
                self.timeout_seconds, e
            ))
        })
    }
}

/// A named set of scanners to run together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProfile {
    pub name: String,
    #[serde(default)]
    pub scanners: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Builder for constructing Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn default_target(mut self, target: impl Into<String>) -> Self {
        self.config.default_target = Some(target.into());
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.config.output_format = format.into();
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.scanner.concurrency = concurrency;
        self
    }

    pub fn timeout_seconds(mut self, secs: f64) -> Self {
        self.config.scanner.timeout_seconds = secs;
        self
    }

    pub fn profile(mut self, name: impl Into<String>, scanners: Vec<String>) -> Self {
        self.config.scan_profiles.push(ScanProfile {
            name: name.into(),
            scanners,
        });
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
