// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sliding-window request throttling.
//!
//! Each key keeps the instants of its recent requests. A request is allowed
//! when fewer than `num_requests` happened within the last `duration`.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Checks between sweeps of idle keys.
const SWEEP_INTERVAL: u64 = 1024;

/// A request budget such as `5/minute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub num_requests: u32,
    pub period: Duration,
}

impl Rate {
    pub fn new(num_requests: u32, period: Duration) -> Self {
        Self {
            num_requests,
            period,
        }
    }

    pub fn per_minute(num_requests: u32) -> Self {
        Self::new(num_requests, Duration::from_secs(60))
    }

    pub fn per_hour(num_requests: u32) -> Self {
        Self::new(num_requests, Duration::from_secs(3600))
    }
}

impl FromStr for Rate {
    type Err = String;

    /// Parse `<n>/<period>`; only the first letter of the period counts
    /// (`s`, `m`, `h`, `d`), so `5/min` and `5/minute` are the same.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, period) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid rate {:?}: expected <n>/<period>", s))?;
        let num_requests = num
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid request count in rate {:?}", s))?;
        let secs = match period.trim().chars().next() {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 3600,
            Some('d') => 86400,
            _ => return Err(format!("invalid period in rate {:?}", s)),
        };
        Ok(Self::new(num_requests, Duration::from_secs(secs)))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.num_requests, self.period.as_secs())
    }
}

/// Per-key sliding-window limiter.
pub struct Throttle {
    rate: Rate,
    history: DashMap<String, VecDeque<Instant>>,
    checks: AtomicU64,
}

impl Throttle {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            history: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    /// Record a request for `key` at `now`.
    ///
    /// Returns `Err(retry_after_secs)` if the key is over budget; rejected
    /// requests are not recorded.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), u64> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep(now);
        }

        let mut entry = self.history.entry(key.to_string()).or_default();
        let window = entry.value_mut();
        while let Some(&oldest) = window.front() {
            if now.saturating_duration_since(oldest) >= self.rate.period {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.rate.num_requests as usize {
            let oldest = window.front().copied().unwrap_or(now);
            let remaining = self
                .rate
                .period
                .saturating_sub(now.saturating_duration_since(oldest));
            return Err(ceil_secs(remaining).max(1));
        }

        window.push_back(now);
        Ok(())
    }

    /// Drop keys with no requests inside the window.
    pub fn sweep(&self, now: Instant) {
        let period = self.rate.period;
        self.history.retain(|_, window| {
            window
                .back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < period)
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.history.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
