use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

/// Counters shared by the simulation workers. Cloning is cheap and every
/// clone observes the same totals.
#[derive(Clone, Default)]
pub struct Metrics {
    pub requests_admitted: Arc<AtomicU64>,
    pub requests_rejected: Arc<AtomicU64>,
    pub rejection_waits: Arc<RwLock<Vec<f64>>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_admitted(&self) {
        self.requests_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn record_rejection_wait(&self, wait_seconds: f64) {
        let mut waits = self.rejection_waits.write().await;
        waits.push(wait_seconds);
        // Keep only the most recent samples
        if waits.len() > 1000 {
            waits.drain(0..500);
        }
    }

    pub async fn get_stats(&self) -> HashMap<String, String> {
        let mut stats = HashMap::new();
        stats.insert(
            "requests_admitted".to_string(),
            self.requests_admitted.load(Ordering::Relaxed).to_string(),
        );
        stats.insert(
            "requests_rejected".to_string(),
            self.requests_rejected.load(Ordering::Relaxed).to_string(),
        );

        let waits = self.rejection_waits.read().await;
        if !waits.is_empty() {
            let avg = waits.iter().sum::<f64>() / waits.len() as f64;
            stats.insert("avg_rejection_wait_seconds".to_string(), avg.to_string());
        }

        stats
    }
}
