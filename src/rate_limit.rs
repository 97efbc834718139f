//! Fixed-window rate limiter.
//!
//! One counter table per limiter, guarded by a single lock. Every check and
//! every reset goes through that lock, so increments are never lost and a
//! key can never be admitted more than `quota` times per window. The window
//! is global: [`spawn_reset_task`] clears the whole table on each tick,
//! regardless of when a client started using its quota.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, info};

use crate::config::RateLimitConfig;
use crate::metrics::{REQUEST_ADMITTED, REQUEST_REJECTED, TRACKED_CLIENTS, WINDOW_RESETS};

pub struct RateLimiter {
    config: RateLimitConfig,
    counters: Mutex<HashMap<String, u32>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count a request for `key`. Returns `false` once the key has used up
    /// its quota for the current window; rejected requests are not counted.
    #[must_use]
    pub fn check(&self, key: &str) -> bool {
        let mut counters = self.counters.lock();

        let count = counters.get(key).copied().unwrap_or(0);
        if count >= self.config.quota {
            drop(counters);
            REQUEST_REJECTED.inc();
            return false;
        }

        counters.insert(key.to_string(), count + 1);
        let tracked = counters.len();
        drop(counters);

        REQUEST_ADMITTED.inc();
        TRACKED_CLIENTS.set(tracked as f64);
        true
    }

    // Start a new window for every client at once
    pub fn reset(&self) -> usize {
        let cleared = std::mem::take(&mut *self.counters.lock()).len();
        WINDOW_RESETS.inc();
        TRACKED_CLIENTS.set(0.0);
        cleared
    }

    pub fn count(&self, key: &str) -> u32 {
        self.counters.lock().get(key).copied().unwrap_or(0)
    }

    pub fn tracked_clients(&self) -> usize {
        self.counters.lock().len()
    }
}

/// Handle to the background task that clears the counter table every window.
pub struct ResetTask {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ResetTask {
    /// Stop the timer and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            error!(error = %e, "Rate limit reset timer failed");
        }
    }
}

// Reset loop - first reset happens one full window after spawn.
// The window must be non-zero; the CLI refuses 0.
pub fn spawn_reset_task(rate_limiter: Arc<RateLimiter>) -> ResetTask {
    let window = rate_limiter.config().window;
    let (stop_tx, mut stop_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + window, window);
        info!(?window, "Rate limit reset timer started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let cleared = rate_limiter.reset();
                    debug!(cleared, "Rate limit window reset");
                }
                _ = &mut stop_rx => break,
            }
        }

        info!("Rate limit reset timer stopped");
    });

    ResetTask { stop_tx, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::Duration;

    fn limiter(quota: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            quota,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn admits_up_to_quota_then_rejects() {
        let limiter = limiter(10);

        for i in 0..10 {
            assert!(limiter.check("client"), "request {} should be admitted", i + 1);
        }
        assert!(!limiter.check("client"));
        assert!(!limiter.check("client"));
        assert_eq!(limiter.count("client"), 10);
    }

    #[test]
    fn unseen_key_has_zero_count() {
        let limiter = limiter(10);
        assert_eq!(limiter.count("nobody"), 0);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn keys_do_not_interfere() {
        let limiter = limiter(3);

        for _ in 0..3 {
            assert!(limiter.check("a"));
        }
        assert!(!limiter.check("a"));

        assert!(limiter.check("b"));
        assert_eq!(limiter.count("b"), 1);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn reset_clears_every_key() {
        let limiter = limiter(2);

        for key in ["a", "b"] {
            assert!(limiter.check(key));
            assert!(limiter.check(key));
            assert!(!limiter.check(key));
        }

        assert_eq!(limiter.reset(), 2);
        assert_eq!(limiter.tracked_clients(), 0);
        assert!(limiter.check("a"));
        assert!(limiter.check("b"));
        assert_eq!(limiter.count("a"), 1);
    }

    #[test]
    fn zero_quota_rejects_everything() {
        let limiter = limiter(0);
        assert!(!limiter.check("a"));
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn concurrent_checks_never_over_admit() {
        let limiter = Arc::new(limiter(10));
        let admitted = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                thread::spawn(move || {
                    for _ in 0..50 {
                        if limiter.check("shared") {
                            admitted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::Relaxed), 10);
        assert_eq!(limiter.count("shared"), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_task_clears_after_one_window() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            quota: 1,
            window: Duration::from_secs(60),
        }));
        let task = spawn_reset_task(Arc::clone(&limiter));

        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!limiter.check("a"), "window should still be running");

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(limiter.check("a"), "window should have been reset");

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_reset_task_no_longer_resets() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            quota: 1,
            window: Duration::from_secs(1),
        }));
        let task = spawn_reset_task(Arc::clone(&limiter));
        task.stop().await;

        assert!(limiter.check("a"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!limiter.check("a"));
    }

    #[tokio::test]
    async fn stop_returns_when_reset_task_panicked() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            quota: 1,
            window: Duration::ZERO,
        }));
        let task = spawn_reset_task(Arc::clone(&limiter));
        tokio::task::yield_now().await;

        task.stop().await;
        assert!(limiter.check("a"));
    }
}
