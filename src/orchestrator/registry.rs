//! Active-file registry.
//!
//! The only contended lock in the orchestrator. It guards nothing but the
//! set of file ids with a transfer in flight and is never held across an
//! `.await`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Set of file ids currently being transferred.
#[derive(Debug, Clone, Default)]
pub struct ActiveFiles {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActiveFiles {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `file_id` for one transfer.
    ///
    /// Returns `None` when another transfer already holds it. The entry is
    /// removed when the returned guard drops.
    #[must_use]
    pub fn try_claim(&self, file_id: &str) -> Option<ActiveFileGuard> {
        let inserted = self.lock().insert(file_id.to_string());
        inserted.then(|| ActiveFileGuard {
            registry: self.clone(),
            file_id: file_id.to_string(),
        })
    }

    /// Whether `file_id` has a transfer in flight.
    #[must_use]
    pub fn contains(&self, file_id: &str) -> bool {
        self.lock().contains(file_id)
    }

    /// Number of transfers in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no transfer is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Registry claim, released on drop.
#[derive(Debug)]
pub struct ActiveFileGuard {
    registry: ActiveFiles,
    file_id: String,
}

impl ActiveFileGuard {
    /// The claimed file id.
    #[must_use]
    pub fn file_id(&self) -> &str {
        &self.file_id
    }
}

impl Drop for ActiveFileGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.file_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_rejected_until_release() {
        let registry = ActiveFiles::new();
        let first = registry.try_claim("beatport:1");
        assert!(first.is_some());
        assert!(registry.try_claim("beatport:1").is_none());
        assert!(registry.contains("beatport:1"));

        drop(first);
        assert!(!registry.contains("beatport:1"));
        assert!(registry.try_claim("beatport:1").is_some());
    }

    #[test]
    fn test_distinct_ids_do_not_conflict() {
        let registry = ActiveFiles::new();
        let a = registry.try_claim("beatport:1");
        let b = registry.try_claim("beatsource:1");
        assert!(a.is_some() && b.is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_guard_releases_on_panic_unwind() {
        let registry = ActiveFiles::new();
        let clone = registry.clone();
        let result = std::thread::spawn(move || {
            let _guard = clone.try_claim("beatport:9");
            panic!("transfer blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
