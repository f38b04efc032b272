use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Activity counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub users_created: Arc<AtomicU64>,
    pub favorites_created: Arc<AtomicU64>,
    pub favorites_deleted: Arc<AtomicU64>,
    pub entries_created: Arc<AtomicU64>,
    pub entries_deleted: Arc<AtomicU64>,
    pub entry_visits: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            users_created: Arc::new(AtomicU64::new(0)),
            favorites_created: Arc::new(AtomicU64::new(0)),
            favorites_deleted: Arc::new(AtomicU64::new(0)),
            entries_created: Arc::new(AtomicU64::new(0)),
            entries_deleted: Arc::new(AtomicU64::new(0)),
            entry_visits: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_users_created(&self) {
        self.users_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_favorites_created(&self) {
        self.favorites_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_favorites_deleted(&self) {
        self.favorites_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_entries_created(&self, count: u64) {
        self.entries_created.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_entries_deleted(&self, count: u64) {
        self.entries_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_entry_visits(&self) {
        self.entry_visits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            users_created: self.users_created.load(Ordering::Relaxed),
            favorites_created: self.favorites_created.load(Ordering::Relaxed),
            favorites_deleted: self.favorites_deleted.load(Ordering::Relaxed),
            entries_created: self.entries_created.load(Ordering::Relaxed),
            entries_deleted: self.entries_deleted.load(Ordering::Relaxed),
            entry_visits: self.entry_visits.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub users_created: u64,
    pub favorites_created: u64,
    pub favorites_deleted: u64,
    pub entries_created: u64,
    pub entries_deleted: u64,
    pub entry_visits: u64,
    pub uptime_seconds: u64,
}
