// ── Alarm admission ──
//
// Rate-limits accepted alarms: a new alarm is admitted only when strictly
// more than `window` has elapsed since the last admitted one. Rejected
// alarms are gone for good; nothing is queued or merged.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thermo_api::AlarmFrame;
use uuid::Uuid;

use crate::model::Alarm;

/// Default minimum spacing between accepted alarms.
pub const DEFAULT_ALARM_WINDOW: Duration = Duration::from_millis(1000);

// ── Clocks ───────────────────────────────────────────────────────────

/// Source of "now" for admission decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// ── Admission rule ───────────────────────────────────────────────────

/// The admission rule on its own: accept the first alarm, then only when
/// `now - last` is strictly greater than `window`.
pub fn admits(now: DateTime<Utc>, last_accepted: Option<DateTime<Utc>>, window: TimeDelta) -> bool {
    match last_accepted {
        None => true,
        Some(last) => now - last > window,
    }
}

/// Outcome of offering an alarm to [`AlarmAdmission::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted(Arc<Alarm>),
    Rejected { since_last: TimeDelta },
}

/// Stateful admission controller. Owns the last-accepted timestamp.
///
/// Not internally synchronized; the store wraps it in a mutex.
#[derive(Debug)]
pub struct AlarmAdmission<C: Clock> {
    clock: C,
    window: TimeDelta,
    last_accepted: Option<DateTime<Utc>>,
}

impl<C: Clock> AlarmAdmission<C> {
    pub fn new(clock: C, window: Duration) -> Self {
        Self {
            clock,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            last_accepted: None,
        }
    }

    pub fn last_accepted(&self) -> Option<DateTime<Utc>> {
        self.last_accepted
    }

    /// Offer one alarm. Accepting stamps it with the clock's "now" and
    /// moves the window forward; rejecting leaves all state untouched.
    pub fn admit(&mut self, frame: &AlarmFrame) -> Admission {
        let now = self.clock.now();

        if !admits(now, self.last_accepted, self.window) {
            let since_last = self.last_accepted.map_or(TimeDelta::zero(), |last| now - last);
            return Admission::Rejected { since_last };
        }

        self.last_accepted = Some(now);
        Admission::Accepted(Arc::new(Alarm {
            id: Uuid::new_v4(),
            accepted_at: now,
            description: frame.alarm_description.clone(),
            reported_at: frame.timestamp.clone(),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn ms(n: i64) -> TimeDelta {
        TimeDelta::milliseconds(n)
    }

    fn frame(desc: &str) -> AlarmFrame {
        AlarmFrame {
            alarm_description: desc.into(),
            timestamp: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn first_alarm_always_admitted() {
        assert!(admits(t0(), None, ms(1000)));
    }

    #[test]
    fn boundary_is_strict() {
        let window = ms(1000);
        assert!(!admits(t0() + ms(999), Some(t0()), window));
        assert!(!admits(t0() + ms(1000), Some(t0()), window));
        assert!(admits(t0() + ms(1001), Some(t0()), window));
    }

    #[test]
    fn backwards_clock_is_rejected() {
        assert!(!admits(t0() - ms(5000), Some(t0()), ms(1000)));
    }

    #[test]
    fn controller_boundary_cases() {
        for (offset, accepted) in [(999, false), (1000, false), (1001, true)] {
            let clock = ManualClock::new(t0());
            let mut adm = AlarmAdmission::new(clock.clone(), DEFAULT_ALARM_WINDOW);

            assert!(matches!(adm.admit(&frame("A")), Admission::Accepted(_)));
            clock.advance(ms(offset));
            let second = adm.admit(&frame("B"));
            assert_eq!(
                matches!(second, Admission::Accepted(_)),
                accepted,
                "offset {offset}ms"
            );
        }
    }

    #[test]
    fn rejection_does_not_move_the_window() {
        let clock = ManualClock::new(t0());
        let mut adm = AlarmAdmission::new(clock.clone(), DEFAULT_ALARM_WINDOW);

        adm.admit(&frame("A"));
        clock.advance(ms(600));
        assert_eq!(
            adm.admit(&frame("B")),
            Admission::Rejected {
                since_last: ms(600)
            }
        );
        // 1200ms after A, even though only 600ms after the rejected B.
        clock.advance(ms(600));
        assert!(matches!(adm.admit(&frame("C")), Admission::Accepted(_)));
        assert_eq!(adm.last_accepted(), Some(t0() + ms(1200)));
    }

    #[test]
    fn accepted_alarm_carries_clock_time_and_device_timestamp() {
        let clock = ManualClock::new(t0());
        let mut adm = AlarmAdmission::new(clock, DEFAULT_ALARM_WINDOW);
        let mut f = frame("Window open");
        f.timestamp = Some("2025-05-01T11:59:59.900".into());

        let Admission::Accepted(alarm) = adm.admit(&f) else {
            panic!("first alarm must be accepted");
        };
        assert_eq!(alarm.accepted_at, t0());
        assert_eq!(alarm.description, "Window open");
        assert_eq!(alarm.reported_at.as_deref(), Some("2025-05-01T11:59:59.900"));
    }

    #[test]
    fn ids_are_unique() {
        let clock = ManualClock::new(t0());
        let mut adm = AlarmAdmission::new(clock.clone(), Duration::ZERO);
        let mut ids = Vec::new();
        for _ in 0..3 {
            clock.advance(ms(1));
            if let Admission::Accepted(a) = adm.admit(&frame("Door open")) {
                ids.push(a.id);
            }
        }
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
    }
}
