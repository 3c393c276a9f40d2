//! Hunter Core - Foundation types, traits, and error handling
//!
//! This crate provides the core abstractions used throughout the Hunter engine:
//! - `Target`: what to scan (host, ports, URL, scheme)
//! - `Finding` / `ScanResult`: what a scanner reports
//! - `Scanner`: the trait every probe implements
//! - `ScanContext`: cancellation and deadlines passed into every scan
//! - `Severity`, `ScanOptions`, `Error`

pub mod context;
pub mod error;
pub mod finding;
pub mod result;
pub mod scanner;
pub mod severity;
pub mod target;

// Re-export commonly used types at crate root
pub use context::{ContextError, ScanContext};
pub use error::{Error, Result};
pub use finding::{sort_findings_by_severity, Finding, FindingBuilder};
pub use result::ScanResult;
pub use scanner::{ExtraArgs, ScanOptions, Scanner};
pub use severity::Severity;
pub use target::{Target, TargetParseError};
