use std::sync::Arc;
use std::time::{Duration, Instant};

use shelf_types::{Document, Record, Timestamp};

/// The last document read or written, and when.
#[derive(Debug)]
pub(crate) struct CacheState {
    updated_at: Timestamp,
    entries: Arc<Vec<Record>>,
    read_time: Option<Instant>,
}

impl CacheState {
    /// A cache that has never been filled. Always stale.
    pub(crate) fn cold() -> Self {
        Self {
            updated_at: Timestamp::zero(),
            entries: Arc::new(Vec::new()),
            read_time: None,
        }
    }

    pub(crate) fn is_stale(&self, window: Duration) -> bool {
        match self.read_time {
            None => true,
            Some(at) => at.elapsed() >= window,
        }
    }

    /// Replace the snapshot and restart the caching window.
    pub(crate) fn fill(&mut self, document: Document) {
        self.updated_at = document.updated_at;
        self.entries = Arc::new(document.entries);
        self.read_time = Some(Instant::now());
    }

    /// Force the next read to go to storage.
    pub(crate) fn invalidate(&mut self) {
        self.read_time = None;
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.entries)
    }

    pub(crate) fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_cache_is_stale() {
        assert!(CacheState::cold().is_stale(Duration::from_secs(3600)));
    }

    #[test]
    fn fill_starts_a_window() {
        let mut cache = CacheState::cold();
        cache.fill(Document::empty());
        assert!(!cache.is_stale(Duration::from_secs(3600)));
        assert!(cache.is_stale(Duration::ZERO));
        assert!(cache.updated_at() > Timestamp::zero());

        cache.invalidate();
        assert!(cache.is_stale(Duration::from_secs(3600)));
    }
}
