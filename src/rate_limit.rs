// Fixed-window limiter with a block period once the quota is used up

use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Shared bucket for callers that can't be attributed to an address.
pub const UNKNOWN_KEY: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Attempts allowed per window before the key is blocked
    pub max_attempts: u32,
    pub window_duration_ms: u64,
    pub block_duration_ms: u64,
    /// Minimum spacing between eviction sweeps
    pub cleanup_interval_ms: u64,
    /// Message returned with every denial
    pub reason: String,
}

impl RateLimitConfig {
    /// Soft throttle for everything under `/api/`: 50 requests a minute,
    /// and a block that simply waits out the window.
    pub fn global_api() -> Self {
        Self {
            max_attempts: 50,
            window_duration_ms: 60_000,
            block_duration_ms: 60_000,
            cleanup_interval_ms: 5 * 60_000,
            reason: "Rate limit exceeded. Please slow down.".to_string(),
        }
    }

    /// Abuse deterrence for account creation: 3 signups per 15 minutes,
    /// then locked out for an hour.
    pub fn signup() -> Self {
        Self {
            max_attempts: 3,
            window_duration_ms: 15 * 60_000,
            block_duration_ms: 60 * 60_000,
            cleanup_interval_ms: 2 * 60 * 60_000,
            reason: "Too many signup attempts. Please try again later.".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Zero("max_attempts"));
        }
        millis("window_duration_ms", self.window_duration_ms)?;
        millis("block_duration_ms", self.block_duration_ms)?;
        millis("cleanup_interval_ms", self.cleanup_interval_ms)?;
        Ok(())
    }
}

fn millis(name: &'static str, ms: u64) -> Result<TimeDelta, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Zero(name));
    }
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .ok_or(ConfigError::OutOfRange(name))
}

// Saturates at the end of representable time instead of panicking
fn after(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn normalize_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        key.to_string()
    }
}

#[derive(Debug, Clone)]
struct RateLimitRecord {
    count: u32,
    window_start: DateTime<Utc>,
    last_attempt: DateTime<Utc>,
    blocked_until: Option<DateTime<Utc>>,
}

impl RateLimitRecord {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_start: now,
            last_attempt: now,
            blocked_until: None,
        }
    }

    fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    fn is_stale(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        self.blocked_until.is_none_or(|until| until < now) && now - self.last_attempt > window
    }
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Set only on denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStats {
    pub key: String,
    pub count: u32,
    pub window_start: DateTime<Utc>,
    pub last_attempt: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
    pub is_blocked: bool,
}

/// Read-only snapshot returned by [`RateLimiter::stats`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStats {
    pub total_tracked_keys: usize,
    pub config: RateLimitConfig,
    pub records: Vec<KeyStats>,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    window: TimeDelta,
    block: TimeDelta,
    cleanup_interval: TimeDelta,
    records: DashMap<String, RateLimitRecord>,
    last_sweep_ms: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let window = millis("window_duration_ms", config.window_duration_ms)?;
        let block = millis("block_duration_ms", config.block_duration_ms)?;
        let cleanup_interval = millis("cleanup_interval_ms", config.cleanup_interval_ms)?;
        let started = clock.now().timestamp_millis();

        Ok(Self {
            config,
            window,
            block,
            cleanup_interval,
            records: DashMap::new(),
            last_sweep_ms: AtomicI64::new(started),
            clock,
        })
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Current time as this limiter sees it.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }

    /// Records one attempt for `key` and decides whether it may proceed.
    ///
    /// The read-decide-write for a key happens under that key's map entry
    /// lock, so concurrent callers for the same key are serialized and at
    /// most `max_attempts` of them are allowed per window. An empty key is
    /// counted against [`UNKNOWN_KEY`].
    pub fn check(&self, key: &str) -> RateLimitResult {
        let now = self.clock.now();
        self.sweep_if_due(now);

        match self.records.entry(normalize_key(key)) {
            Entry::Vacant(slot) => {
                let record = slot.insert(RateLimitRecord::fresh(now));
                self.allowed(record.count, record.window_start)
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();

                if let Some(until) = record.blocked_until {
                    if until > now {
                        return self.denied(until);
                    }
                }

                // A lapsed block always starts over, even on the exact window boundary
                if record.blocked_until.is_some() || now - record.window_start > self.window {
                    *record = RateLimitRecord::fresh(now);
                    return self.allowed(record.count, record.window_start);
                }

                record.last_attempt = now;

                if record.count >= self.config.max_attempts {
                    let until = after(now, self.block);
                    record.blocked_until = Some(until);
                    return self.denied(until);
                }

                record.count += 1;
                self.allowed(record.count, record.window_start)
            }
        }
    }

    /// Forgets everything about `key`. No-op for unknown keys.
    pub fn reset(&self, key: &str) {
        self.records.remove(&normalize_key(key));
    }

    /// Snapshot of every tracked key, sorted by key. Never evicts.
    pub fn stats(&self) -> RateLimitStats {
        let now = self.clock.now();
        let mut records: Vec<KeyStats> = self
            .records
            .iter()
            .map(|entry| {
                let record = entry.value();
                KeyStats {
                    key: entry.key().clone(),
                    count: record.count,
                    window_start: record.window_start,
                    last_attempt: record.last_attempt,
                    blocked_until: record.blocked_until,
                    is_blocked: record.is_blocked_at(now),
                }
            })
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));

        RateLimitStats {
            total_tracked_keys: records.len(),
            config: self.config.clone(),
            records,
        }
    }

    fn allowed(&self, count: u32, window_start: DateTime<Utc>) -> RateLimitResult {
        RateLimitResult {
            allowed: true,
            remaining: self.config.max_attempts.saturating_sub(count),
            reset_at: after(window_start, self.window),
            reason: None,
        }
    }

    fn denied(&self, until: DateTime<Utc>) -> RateLimitResult {
        RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_at: until,
            reason: Some(self.config.reason.clone()),
        }
    }

    fn sweep_if_due(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if now_ms.saturating_sub(last) < self.cleanup_interval.num_milliseconds() {
            return;
        }
        // Whoever wins the swap sweeps; everyone else carries on
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let before = self.records.len();
        let window = self.window;
        self.records.retain(|_, record| !record.is_stale(now, window));
        let evicted = before.saturating_sub(self.records.len());
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.records.len(),
                "Swept stale rate limit records"
            );
        }
    }
}
