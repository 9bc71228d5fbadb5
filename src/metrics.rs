use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide request counter, shared by handle through the app state
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    hits: AtomicU64,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}
