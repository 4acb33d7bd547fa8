//! Login attempt tracking and lockout
//!
//! Bounds the rate of failed logins per identifier. Constructed from the
//! configured policy and injected through application state so tests get
//! a fresh tracker each and a distributed store could replace it without
//! touching call sites.
//!
//! All state lives behind one mutex. Callers must not run the (slow)
//! password verification while holding it; the tracker only does map
//! lookups and arithmetic under the lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
struct AttemptRecord {
    failures: u32,
    first_failure_at: Instant,
    locked_until: Option<Instant>,
}

/// Per-identifier failed-login counter with lockout
pub struct LoginAttemptTracker {
    records: Mutex<HashMap<String, AttemptRecord>>,
    threshold: u32,
    window: Duration,
    lockout: Duration,
}

impl LoginAttemptTracker {
    pub fn new(threshold: u32, window: Duration, lockout: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            threshold,
            window,
            lockout,
        }
    }

    /// Record a failed attempt for `identifier`
    ///
    /// Failures older than the tracking window restart the count. Hitting
    /// the threshold sets the lock.
    pub async fn record_failure(&self, identifier: &str) {
        let now = Instant::now();
        let mut records = self.records.lock().await;

        let record = records
            .entry(identifier.to_string())
            .and_modify(|r| {
                let lock_expired = r.locked_until.is_some_and(|until| now >= until);
                let window_elapsed = r.locked_until.is_none()
                    && now.duration_since(r.first_failure_at) > self.window;
                if lock_expired || window_elapsed {
                    r.failures = 0;
                    r.first_failure_at = now;
                    r.locked_until = None;
                }
                r.failures += 1;
            })
            .or_insert(AttemptRecord {
                failures: 1,
                first_failure_at: now,
                locked_until: None,
            });

        if record.failures >= self.threshold && record.locked_until.is_none() {
            record.locked_until = Some(now + self.lockout);
            warn!(identifier, failures = record.failures, "Login lockout engaged");
        }
    }

    /// Clear the record for `identifier` after a successful login
    pub async fn record_success(&self, identifier: &str) {
        self.records.lock().await.remove(identifier);
    }

    /// True while the identifier is inside its lockout window
    pub async fn is_locked(&self, identifier: &str) -> bool {
        let records = self.records.lock().await;
        records
            .get(identifier)
            .and_then(|r| r.locked_until)
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    /// Administrative hook: clear one identifier
    pub async fn reset(&self, identifier: &str) {
        self.records.lock().await.remove(identifier);
    }

    /// Test hook: clear everything. Not wired to any HTTP route.
    pub async fn reset_all(&self) {
        self.records.lock().await.clear();
    }
}
