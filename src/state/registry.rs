//! Dedup registry: the only gate against refetching or double-processing a URL

use dashmap::DashSet;

/// Tracks URLs currently claimed for fetch/process and URLs already
/// scheduled for recursive expansion
///
/// Both sets are sharded concurrent sets, so insert-if-absent is atomic per
/// URL without a registry-wide lock. There is no blocking or error path;
/// callers only ever see boolean outcomes.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    /// URLs claimed by an in-flight task; entries are released on completion
    processing: DashSet<String>,

    /// URLs scheduled for expansion; grows monotonically for the session
    visited: DashSet<String>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for processing
    ///
    /// Returns `false` if another task already holds the claim, in which case
    /// the caller must abandon the URL.
    pub fn try_claim(&self, url: &str) -> bool {
        self.processing.insert(url.to_string())
    }

    /// Drops the claim on `url`
    ///
    /// Must be called exactly once per successful [`try_claim`](Self::try_claim).
    /// Returns whether a claim was actually held.
    pub fn release(&self, url: &str) -> bool {
        self.processing.remove(url).is_some()
    }

    /// Adds `url` to the visited set, returning `true` only for the first caller
    pub fn mark_visited_if_new(&self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_claimed(&self, url: &str) -> bool {
        self.processing.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn processing_count(&self) -> usize {
        self.processing.len()
    }

    /// Read-only `(visited, processing)` counts for status reporting
    pub fn sizes(&self) -> (usize, usize) {
        (self.visited_count(), self.processing_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_claim_then_release() {
        let registry = DedupRegistry::new();

        assert!(registry.try_claim("https://example.com/"));
        assert!(registry.is_claimed("https://example.com/"));
        assert!(!registry.try_claim("https://example.com/"));

        assert!(registry.release("https://example.com/"));
        assert!(!registry.is_claimed("https://example.com/"));
        assert!(registry.try_claim("https://example.com/"));
    }

    #[test]
    fn test_release_without_claim() {
        let registry = DedupRegistry::new();
        assert!(!registry.release("https://example.com/never-claimed"));
        assert_eq!(registry.processing_count(), 0);
    }

    #[test]
    fn test_mark_visited_only_once() {
        let registry = DedupRegistry::new();

        assert!(registry.mark_visited_if_new("https://example.com/a"));
        assert!(!registry.mark_visited_if_new("https://example.com/a"));
        assert!(registry.mark_visited_if_new("https://example.com/b"));
        assert_eq!(registry.visited_count(), 2);
    }

    #[test]
    fn test_visited_and_processing_are_independent() {
        let registry = DedupRegistry::new();

        registry.mark_visited_if_new("https://example.com/");
        assert!(registry.try_claim("https://example.com/"));
        registry.release("https://example.com/");

        // Releasing a claim never forgets that a URL was visited
        assert!(registry.is_visited("https://example.com/"));
        assert_eq!(registry.sizes(), (1, 0));
    }

    #[test]
    fn test_concurrent_claims_have_single_winner() {
        const CONTENDERS: usize = 16;

        let registry = Arc::new(DedupRegistry::new());
        let barrier = Arc::new(Barrier::new(CONTENDERS));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..CONTENDERS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    barrier.wait();
                    if registry.try_claim("https://example.com/contested") {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(registry.processing_count(), 1);
    }

    #[test]
    fn test_concurrent_mark_visited_has_single_winner() {
        const CONTENDERS: usize = 16;

        let registry = Arc::new(DedupRegistry::new());
        let barrier = Arc::new(Barrier::new(CONTENDERS));

        let handles: Vec<_> = (0..CONTENDERS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.mark_visited_if_new("https://example.com/link")
                })
            })
            .collect();

        let newly_marked = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|marked| *marked)
            .count();

        assert_eq!(newly_marked, 1);
        assert_eq!(registry.visited_count(), 1);
    }

    #[test]
    fn test_concurrent_claim_release_cycles_leave_registry_empty() {
        const WORKERS: usize = 8;
        const URLS_PER_WORKER: usize = 200;

        let registry = Arc::new(DedupRegistry::new());
        let barrier = Arc::new(Barrier::new(WORKERS));

        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..URLS_PER_WORKER {
                        let url = format!("https://example.com/{}/{}", worker, i);
                        assert!(registry.try_claim(&url));
                        assert!(registry.mark_visited_if_new(&url));
                        assert!(registry.release(&url));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.sizes(), (WORKERS * URLS_PER_WORKER, 0));
    }
}
