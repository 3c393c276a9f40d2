//! Hunter Probes - built-in scanners
//!
//! - `port`: TCP connect scan with service identification

pub mod port;

pub use port::{identify_service, resolve_ports, PortScanner};

use hunter_core::Scanner;
use std::sync::Arc;

/// Every built-in scanner, ready to register
pub fn builtin_scanners() -> Vec<Arc<dyn Scanner>> {
    vec![Arc::new(PortScanner::new())]
}
