//! Failed-login throttling
//!
//! Counts login attempts per account key. Every attempt reserves a slot
//! before the password is checked; a successful login clears the key and a
//! failed one keeps its slot. Once a key holds `max_failures` slots inside
//! the window it is locked out until the lockout elapses.
//!
//! Records whose window and lockout have both passed are dropped when their
//! key is seen again, and by a sweep that runs at most once per window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Login throttle configuration
#[derive(Debug, Clone)]
pub struct LoginThrottleConfig {
    /// Failures tolerated inside one window
    pub max_failures: u32,
    /// Window over which failures are counted
    pub window: Duration,
    /// How long a key stays locked once the limit is hit
    pub lockout: Duration,
}

impl Default for LoginThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(300),  // 5 minutes
            lockout: Duration::from_secs(900), // 15 minutes
        }
    }
}

impl LoginThrottleConfig {
    /// Create a new LoginThrottleConfig from environment variables
    ///
    /// # Environment Variables
    /// - `LOGIN_MAX_FAILURES`: Failures before lockout (default: 5)
    /// - `LOGIN_FAILURE_WINDOW_SECS`: Counting window in seconds (default: 300)
    /// - `LOGIN_LOCKOUT_SECS`: Lockout duration in seconds (default: 900)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let max_failures = read_env("LOGIN_MAX_FAILURES", defaults.max_failures)?;
        let window = read_env("LOGIN_FAILURE_WINDOW_SECS", defaults.window.as_secs())?;
        let lockout = read_env("LOGIN_LOCKOUT_SECS", defaults.lockout.as_secs())?;

        if max_failures == 0 {
            anyhow::bail!("LOGIN_MAX_FAILURES must be at least 1");
        }

        Ok(Self {
            max_failures,
            window: Duration::from_secs(window),
            lockout: Duration::from_secs(lockout),
        })
    }
}

fn read_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
struct FailureRecord {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

impl FailureRecord {
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.locked_until {
            Some(until) => now >= until,
            None => now.duration_since(self.window_start) >= window,
        }
    }
}

#[derive(Debug)]
struct Records {
    by_key: HashMap<String, FailureRecord>,
    last_sweep: Instant,
}

/// Shared failed-login tracker
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    config: LoginThrottleConfig,
    records: Arc<Mutex<Records>>,
}

impl LoginThrottle {
    pub fn new(config: LoginThrottleConfig) -> Self {
        Self {
            config,
            records: Arc::new(Mutex::new(Records {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Reserve an attempt for `key`; `false` while `key` is locked out.
    ///
    /// The reservation counts as a failure until [`reset`](Self::reset)
    /// is called for a successful login.
    pub async fn try_begin(&self, key: &str) -> bool {
        self.try_begin_at(key, Instant::now()).await
    }

    /// Forget everything about `key`
    pub async fn reset(&self, key: &str) {
        self.records.lock().await.by_key.remove(key);
    }

    async fn try_begin_at(&self, key: &str, now: Instant) -> bool {
        let mut records = self.records.lock().await;
        self.sweep(&mut records, now);

        if records
            .by_key
            .get(key)
            .is_some_and(|record| record.is_stale(now, self.config.window))
        {
            records.by_key.remove(key);
        }

        let record = records
            .by_key
            .entry(key.to_string())
            .or_insert(FailureRecord {
                failures: 0,
                window_start: now,
                locked_until: None,
            });

        if record.locked_until.is_some() {
            return false;
        }

        record.failures += 1;
        if record.failures >= self.config.max_failures {
            record.locked_until = Some(now + self.config.lockout);
            warn!(
                "Locked login for {} after {} attempts",
                key, record.failures
            );
        }
        true
    }

    fn sweep(&self, records: &mut Records, now: Instant) {
        if now.duration_since(records.last_sweep) < self.config.window {
            return;
        }

        let window = self.config.window;
        let before = records.by_key.len();
        records
            .by_key
            .retain(|_, record| !record.is_stale(now, window));
        records.last_sweep = now;

        let evicted = before - records.by_key.len();
        if evicted > 0 {
            debug!("Evicted {} stale login throttle records", evicted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn throttle(max_failures: u32) -> LoginThrottle {
        LoginThrottle::new(LoginThrottleConfig {
            max_failures,
            window: Duration::from_secs(60),
            lockout: Duration::from_secs(120),
        })
    }

    async fn tracked(t: &LoginThrottle) -> usize {
        t.records.lock().await.by_key.len()
    }

    #[tokio::test]
    async fn unknown_keys_are_allowed() {
        assert!(throttle(3).try_begin("bob@x.com").await);
    }

    #[tokio::test]
    async fn locks_after_max_attempts() {
        let t = throttle(3);
        let now = Instant::now();

        assert!(t.try_begin_at("bob@x.com", now).await);
        assert!(t.try_begin_at("bob@x.com", now).await);
        assert!(t.try_begin_at("bob@x.com", now).await);
        assert!(!t.try_begin_at("bob@x.com", now).await);
        assert!(t.try_begin_at("alice@x.com", now).await);
    }

    #[tokio::test]
    async fn lockout_expires() {
        let t = throttle(1);
        let now = Instant::now();

        assert!(t.try_begin_at("bob@x.com", now).await);
        assert!(!t.try_begin_at("bob@x.com", now + Duration::from_secs(119)).await);
        assert!(t.try_begin_at("bob@x.com", now + Duration::from_secs(120)).await);
    }

    #[tokio::test]
    async fn attempts_outside_the_window_are_forgotten() {
        let t = throttle(2);
        let now = Instant::now();

        assert!(t.try_begin_at("bob@x.com", now).await);
        assert!(t.try_begin_at("bob@x.com", now + Duration::from_secs(61)).await);
        assert!(t.try_begin_at("bob@x.com", now + Duration::from_secs(61)).await);
    }

    #[tokio::test]
    async fn reset_clears_attempts() {
        let t = throttle(2);
        let now = Instant::now();

        assert!(t.try_begin_at("bob@x.com", now).await);
        t.reset("bob@x.com").await;
        assert!(t.try_begin_at("bob@x.com", now).await);
        assert_eq!(tracked(&t).await, 1);
    }

    #[tokio::test]
    async fn stale_records_are_evicted() {
        let t = throttle(3);
        let now = Instant::now();

        for i in 0..1000 {
            assert!(t.try_begin_at(&format!("user{}@x.com", i), now).await);
        }
        assert_eq!(tracked(&t).await, 1000);

        // Revisiting a key drops its expired record before counting anew.
        let later = now + Duration::from_secs(3600);
        assert!(t.try_begin_at("user0@x.com", later).await);
        assert_eq!(
            t.records.lock().await.by_key["user0@x.com"].failures,
            1
        );

        // The sweep removed every other expired record.
        assert_eq!(tracked(&t).await, 1);
    }

    #[tokio::test]
    async fn sweep_keeps_live_lockouts() {
        let t = throttle(2);
        let now = Instant::now();

        assert!(t.try_begin_at("locked@x.com", now).await);
        assert!(t.try_begin_at("locked@x.com", now).await);
        assert!(t.try_begin_at("idle@x.com", now).await);

        // Past the window but inside the lockout.
        let later = now + Duration::from_secs(90);
        assert!(t.try_begin_at("fresh@x.com", later).await);
        assert_eq!(tracked(&t).await, 2);
        assert!(!t.try_begin_at("locked@x.com", later).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_attempts_cannot_exceed_the_limit() {
        let t = throttle(3);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let t = t.clone();
                tokio::spawn(async move { t.try_begin("bob@x.com").await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
    }

    #[test]
    #[serial]
    fn config_from_env() {
        unsafe {
            std::env::set_var("LOGIN_MAX_FAILURES", "3");
            std::env::set_var("LOGIN_LOCKOUT_SECS", "60");
            std::env::remove_var("LOGIN_FAILURE_WINDOW_SECS");
        }

        let config = LoginThrottleConfig::from_env().unwrap();
        assert_eq!(config.max_failures, 3);
        assert_eq!(config.window, Duration::from_secs(300));
        assert_eq!(config.lockout, Duration::from_secs(60));

        unsafe {
            std::env::set_var("LOGIN_MAX_FAILURES", "0");
        }
        assert!(LoginThrottleConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("LOGIN_MAX_FAILURES");
            std::env::remove_var("LOGIN_LOCKOUT_SECS");
        }
    }
}
