//! Bounded in-memory activity history.
//!
//! A fixed-capacity FIFO: once full, each new entry evicts the oldest one.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

/// Default number of entries retained per log.
pub const DEFAULT_HISTORY_SIZE: usize = 50;

/// An entry with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timestamped<T> {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: T,
}

pub struct ActivityLog<T> {
    capacity: usize,
    entries: Mutex<VecDeque<Timestamped<T>>>,
}

impl<T: Clone> ActivityLog<T> {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub async fn record(&self, entry: T) {
        self.record_at(Utc::now(), entry).await;
    }

    pub async fn record_at(&self, at: DateTime<Utc>, entry: T) {
        let mut entries = self.entries.lock().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Timestamped { at, entry });
    }

    /// Copy of the retained entries, oldest first.
    pub async fn snapshot(&self) -> Vec<Timestamped<T>> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> Default for ActivityLog<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
