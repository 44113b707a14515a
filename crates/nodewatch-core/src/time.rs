//! Time primitives for NodeWatch
//!
//! All comparisons in the ingestion core (last seen, duplicate window,
//! liveness) are made between timestamps taken from the same [`Clock`].
//! Absolute values only become meaningful once the clock collaborator has
//! synchronized; the core never depends on that.

use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds on the clock collaborator's timeline
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    #[inline]
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs(self) -> i64 {
        self.0.div_euclid(1000)
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration_millis(duration)))
    }

    #[inline]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_sub(duration_millis(duration)))
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    #[inline]
    pub fn elapsed_since(self, earlier: Timestamp) -> Duration {
        self - earlier
    }
}

#[inline]
fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Timestamp) -> Self::Output {
        let diff = self.0.saturating_sub(rhs.0);
        if diff > 0 {
            Duration::from_millis(diff as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl std::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({}ms)", self.0)
    }
}

/// Clock collaborator
pub trait Clock: Send + Sync {
    /// Current time on this clock's timeline
    fn now(&self) -> Timestamp;

    /// Whether absolute values can be trusted (e.g. for log records)
    fn is_synchronized(&self) -> bool {
        true
    }
}

/// Wall clock values earlier than this (2020-01-01T00:00:00Z) mean the
/// host has not received network time yet.
pub const SYNC_FLOOR: Timestamp = Timestamp(1_577_836_800_000);

/// Wall clock backed by the operating system
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        SystemClock
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration_millis(since_epoch))
    }

    fn is_synchronized(&self) -> bool {
        self.now() >= SYNC_FLOOR
    }
}

/// Manually driven clock for simulation and tests
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
    synchronized: AtomicBool,
}

impl ManualClock {
    /// Create a synchronized clock starting at `start`
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            millis: AtomicI64::new(start.0),
            synchronized: AtomicBool::new(true),
        }
    }

    /// Jump to an absolute time (may move backwards)
    pub fn set(&self, t: Timestamp) {
        self.millis.store(t.0, Ordering::SeqCst);
    }

    /// Advance by a duration, returning the new time
    pub fn advance(&self, dt: Duration) -> Timestamp {
        let step = duration_millis(dt);
        let prev = self.millis.fetch_add(step, Ordering::SeqCst);
        Timestamp(prev.saturating_add(step))
    }

    pub fn set_synchronized(&self, synchronized: bool) {
        self.synchronized.store(synchronized, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Timestamp::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::SeqCst))
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_timestamp_difference_saturates() {
        let early = Timestamp::from_secs(10);
        let late = Timestamp::from_secs(12);

        assert_eq!(late - early, Duration::from_secs(2));
        assert_eq!(early - late, Duration::ZERO);
        assert_eq!(late.elapsed_since(early), Duration::from_secs(2));
    }

    #[test]
    fn test_timestamp_duration_arithmetic() {
        let t = Timestamp::from_millis(1_500);
        assert_eq!(t + Duration::from_millis(500), Timestamp::from_millis(2_000));
        assert_eq!(t - Duration::from_millis(2_000), Timestamp::from_millis(-500));
        assert_eq!(Timestamp::MAX + Duration::from_secs(1), Timestamp::MAX);
        assert_eq!(Timestamp::from_millis(-1).as_secs(), -1);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Timestamp::from_secs(100));
        assert_eq!(clock.now(), Timestamp::from_secs(100));

        let t = clock.advance(Duration::from_millis(250));
        assert_eq!(t, Timestamp::from_millis(100_250));
        assert_eq!(clock.now(), t);

        clock.set(Timestamp::from_secs(5));
        assert_eq!(clock.now(), Timestamp::from_secs(5));

        assert!(clock.is_synchronized());
        clock.set_synchronized(false);
        assert!(!clock.is_synchronized());
    }

    #[test]
    fn test_system_clock_is_past_floor() {
        let clock = SystemClock::new();
        assert!(clock.now() > SYNC_FLOOR);
        assert!(clock.is_synchronized());
    }

    proptest! {
        #[test]
        fn prop_add_then_subtract(start in -1_000_000_000i64..1_000_000_000, ms in 0u64..1_000_000_000) {
            let t = Timestamp::from_millis(start);
            let later = t + Duration::from_millis(ms);
            prop_assert_eq!(later - t, Duration::from_millis(ms));
            prop_assert_eq!(t - later, Duration::ZERO);
        }
    }
}
