//! Session Clock
//!
//! Provides the two time sources a capture session needs:
//! - a wall-clock timestamp stamped onto every interaction
//! - a monotonic millisecond counter used to compute `relative_time_ms`
//!
//! `SystemClock` is backed by `Instant` and `Utc::now()`. `ManualClock` is
//! driven explicitly, which makes event-log replay and tests deterministic.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Time source for a capture session
pub trait Clock {
    /// Current wall-clock time
    fn now_wall(&self) -> DateTime<Utc>;

    /// Monotonic milliseconds since an arbitrary, fixed origin
    fn now_millis(&self) -> u64;
}

/// Real clock: monotonic counter from `Instant`, wall time from the system
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_wall(&self) -> DateTime<Utc> {
        Utc::now()
    }

    #[inline]
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock.
///
/// Clones share the same counter, so a test can keep one handle while the
/// session owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    epoch: DateTime<Utc>,
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock whose wall time starts at `epoch`
    pub fn starting_at(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            millis: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a clock starting at the Unix epoch
    pub fn new() -> Self {
        Self::starting_at(DateTime::UNIX_EPOCH)
    }

    /// Move the clock forward
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute offset. Values behind the current reading are ignored.
    pub fn set(&self, millis: u64) {
        self.millis.fetch_max(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_wall(&self) -> DateTime<Utc> {
        self.epoch + Duration::milliseconds(self.now_millis() as i64)
    }

    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
