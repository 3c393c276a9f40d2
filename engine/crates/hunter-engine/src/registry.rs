//! Scanner registry - index of all available scanners

use hunter_core::{Error, Result, Scanner};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all available scanners, keyed by `Scanner::name`.
///
/// Populate it once at startup, then share it (usually behind an `Arc`)
/// for reads only. There is no internal locking; registering while other
/// tasks read requires the caller to hold the only reference.
#[derive(Default)]
pub struct ScannerRegistry {
    scanners: HashMap<String, Arc<dyn Scanner>>,
}

impl ScannerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            scanners: HashMap::new(),
        }
    }

    /// Register a scanner, replacing any scanner with the same name
    pub fn register(&mut self, scanner: Arc<dyn Scanner>) {
        let name = scanner.name().to_string();
        if self.scanners.insert(name.clone(), scanner).is_some() {
            tracing::warn!("Scanner {} registered twice, keeping the latest", name);
        }
    }

    /// Get a scanner by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn Scanner>> {
        self.scanners
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ScannerNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scanners.contains_key(name)
    }

    /// All scanners, ordered by name
    pub fn all(&self) -> Vec<Arc<dyn Scanner>> {
        let mut all: Vec<_> = self.scanners.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// All scanner names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scanners.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get number of registered scanners
    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

impl std::fmt::Debug for ScannerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerRegistry")
            .field("scanners", &self.names())
            .finish()
    }
}
