use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::models::decision::Decision;

#[derive(Debug, Error, PartialEq)]
pub enum InvalidBucketConfig {
    #[error("capacity must be at least 1 token")]
    ZeroCapacity,

    #[error("refill interval must be greater than zero")]
    ZeroRefillInterval,

    #[error("refill interval seconds must be positive and finite, got {0}")]
    BadRefillSeconds(f64),
}

/// Read-only view of a bucket's counters, taken without consuming a token.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BucketSnapshot {
    pub tokens: u64,
    pub capacity: u64,
}

#[derive(Debug)]
struct BucketState {
    tokens: u64,
    last_refill: Instant,
}

/// Token bucket guarding admission for one logical account.
///
/// The bucket starts full and accrues one token per `refill_interval`,
/// computed lazily inside [`TokenBucket::try_consume`] rather than by a
/// background timer, so idle buckets cost nothing. Handles are cheap clones
/// sharing the same state and can be hit from many tasks or threads at once;
/// the `(tokens, last_refill)` pair sits behind a single mutex and every
/// refill-and-decide sequence runs as one critical section.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u64,
    refill_interval: Duration,
    state: Arc<Mutex<BucketState>>,
}

impl TokenBucket {
    pub fn new(capacity: u64, refill_interval: Duration) -> Result<Self, InvalidBucketConfig> {
        if capacity == 0 {
            return Err(InvalidBucketConfig::ZeroCapacity);
        }
        if refill_interval.is_zero() {
            return Err(InvalidBucketConfig::ZeroRefillInterval);
        }
        Ok(Self {
            capacity,
            refill_interval,
            state: Arc::new(Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            })),
        })
    }

    /// Builds a bucket from an interval expressed in seconds, rejecting NaN,
    /// infinite, and non-positive values instead of clamping them.
    pub fn with_refill_secs(capacity: u64, secs: f64) -> Result<Self, InvalidBucketConfig> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(InvalidBucketConfig::BadRefillSeconds(secs));
        }
        Self::new(capacity, Duration::from_secs_f64(secs))
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    /// Refills the bucket for the elapsed time, then admits the caller if a
    /// token is available. Never blocks beyond the bucket lock and never
    /// errors; a full bucket of rejections is still a sequence of ordinary
    /// [`Decision`] values.
    pub fn try_consume(&self) -> Decision {
        let mut state = self.state.lock().unwrap();

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        let interval = self.refill_interval.as_nanos();
        let tokens_to_add = (elapsed.as_nanos() / interval) as u64;
        if tokens_to_add > 0 {
            state.tokens = state
                .tokens
                .saturating_add(tokens_to_add)
                .min(self.capacity);
            // Advance by whole intervals; the fractional remainder stays on
            // the clock toward the next token.
            let remainder = Duration::from_nanos((elapsed.as_nanos() % interval) as u64);
            state.last_refill = now - remainder;
        }

        if state.tokens >= 1 {
            state.tokens -= 1;
            Decision::Admitted {
                remaining_tokens: state.tokens,
            }
        } else {
            let since_refill = now.duration_since(state.last_refill);
            Decision::Rejected {
                remaining_tokens: 0,
                wait: self.refill_interval - since_refill,
            }
        }
    }

    /// Snapshot of the current counters without consuming. Pending refill is
    /// not applied, so the value may lag behind what `try_consume` would see;
    /// the snapshot is diagnostic and never drives admission.
    pub fn peek(&self) -> BucketSnapshot {
        let state = self.state.lock().unwrap();
        BucketSnapshot {
            tokens: state.tokens,
            capacity: self.capacity,
        }
    }
}
