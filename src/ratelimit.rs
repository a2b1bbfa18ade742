//! Fixed-window admission gate keyed by client identity.
//!
//! Sliding-window-by-pruning: each identity keeps the epoch-ms timestamps of
//! its admitted requests; every check prunes entries older than the window and
//! admits only while the pruned count stays under the quota. A full burst at
//! t=0 followed by another at t=60001 both pass; the window is not smoothed.
//!
//! Identities are never evicted, so the map grows with the number of distinct
//! clients seen over the process lifetime.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub const WINDOW_MS: u64 = 60_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
  Allowed,
  Denied,
}

/// Owned, injectable gate state. Constructed once at startup and shared via
/// `AppState`; tests build isolated instances with small quotas and windows.
pub struct RateLimiter {
  windows: Mutex<HashMap<String, Vec<u64>>>,
  quota: usize,
  window_ms: u64,
}

impl RateLimiter {
  pub fn new(quota: usize) -> Self {
    Self::with_window(quota, WINDOW_MS)
  }

  pub fn with_window(quota: usize, window_ms: u64) -> Self {
    Self { windows: Mutex::new(HashMap::new()), quota, window_ms }
  }

  /// Admission check for one request from `identity` at `now_ms`.
  ///
  /// Prune-then-append runs under a single lock so two racing requests cannot
  /// both take the last slot. A denied request does not consume a slot.
  pub fn admit(&self, identity: &str, now_ms: u64) -> Decision {
    let mut windows = self.windows.lock().unwrap();
    let window = windows.entry(identity.to_string()).or_default();
    // Retain stamps with now - t < window; saturation keeps clock skew benign.
    window.retain(|&t| now_ms.saturating_sub(t) < self.window_ms);
    if window.len() >= self.quota {
      return Decision::Denied;
    }
    window.push(now_ms);
    Decision::Allowed
  }
}

/// Milliseconds since the Unix epoch, the clock the gate runs on.
pub fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or(0)
}
