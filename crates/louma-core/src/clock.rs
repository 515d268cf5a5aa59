//! Time source injected into services so timestamps are testable.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for every timestamp a service writes.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to.
///
/// Cloning is cheap and clones share the same instant, so a test can keep a
/// handle and advance the clock seen by a service.
#[derive(Debug, Clone)]
pub struct FixedClock {
  at: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
  pub fn new(at: DateTime<Utc>) -> Self { Self { at: Arc::new(Mutex::new(at)) } }

  pub fn set(&self, at: DateTime<Utc>) {
    *self.at.lock().unwrap_or_else(|p| p.into_inner()) = at;
  }

  pub fn advance(&self, by: Duration) {
    let mut at = self.at.lock().unwrap_or_else(|p| p.into_inner());
    *at += by;
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    *self.at.lock().unwrap_or_else(|p| p.into_inner())
  }
}
