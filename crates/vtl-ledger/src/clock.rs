use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Source of block timestamps.
pub trait Clock {
    /// Current time as an RFC 3339 UTC string.
    fn now_timestamp(&self) -> String;
}

/// Format a UTC instant the way block timestamps are stored:
/// millisecond precision with a `Z` suffix, e.g. `2025-01-01T08:30:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_timestamp(&self) -> String {
        format_timestamp(Utc::now())
    }
}

/// Deterministic clock for tests: starts at a fixed instant and advances by
/// a fixed step on every reading.
#[derive(Debug)]
pub struct FixedClock {
    start: DateTime<Utc>,
    step_ms: i64,
    ticks: AtomicI64,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step_ms: step.num_milliseconds(),
            ticks: AtomicI64::new(0),
        }
    }

    /// A clock starting at the Unix epoch, advancing one second per reading.
    pub fn epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH, Duration::seconds(1))
    }
}

impl Clock for FixedClock {
    fn now_timestamp(&self) -> String {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        format_timestamp(self.start + Duration::milliseconds(tick * self.step_ms))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_timestamp(&self) -> String {
        (**self).now_timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 8, 30, 0).unwrap();
        assert_eq!(format_timestamp(at), "2025-01-01T08:30:00.000Z");
    }

    #[test]
    fn system_clock_is_rfc3339_millis() {
        let ts = SystemClock.now_timestamp();
        assert_eq!(ts.len(), "2025-01-01T08:30:00.000Z".len());
        assert!(ts.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::epoch();
        assert_eq!(clock.now_timestamp(), "1970-01-01T00:00:00.000Z");
        assert_eq!(clock.now_timestamp(), "1970-01-01T00:00:01.000Z");
        assert_eq!((&clock).now_timestamp(), "1970-01-01T00:00:02.000Z");
    }
}
