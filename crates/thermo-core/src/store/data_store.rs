// ── Central reactive data store ──
//
// One status record and one alarm log, both behind `watch` channels.
// Merges are serialized by `send_if_modified`; admission state sits behind
// a mutex so concurrent alarm offers are decided one at a time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thermo_api::{AlarmFrame, TelemetryFrame};
use tokio::sync::watch;
use tracing::debug;

use super::alarm_log::AlarmLog;
use crate::model::{Alarm, DeviceStatus, Mode};
use crate::reconcile::{Admission, AlarmAdmission, Clock, apply};
use crate::stream::StateStream;

/// Reactive store for the derived dashboard state.
pub struct DataStore {
    status: watch::Sender<Arc<DeviceStatus>>,
    alarms: AlarmLog,
    admission: Mutex<AlarmAdmission<Arc<dyn Clock>>>,
    clock: Arc<dyn Clock>,
    last_telemetry: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new(clock: Arc<dyn Clock>, alarm_window: Duration, alarm_retention: Option<usize>) -> Self {
        let (status, _) = watch::channel(Arc::new(DeviceStatus::default()));
        let (last_telemetry, _) = watch::channel(None);

        Self {
            status,
            alarms: AlarmLog::new(alarm_retention),
            admission: Mutex::new(AlarmAdmission::new(Arc::clone(&clock), alarm_window)),
            clock,
            last_telemetry,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Merge a telemetry frame into the status record.
    ///
    /// Subscribers are notified only when the record actually changes. A
    /// frame with no known field is not telemetry for timing purposes and
    /// leaves `last_telemetry` alone.
    pub fn apply_telemetry(&self, frame: &TelemetryFrame) -> Arc<DeviceStatus> {
        if frame.is_empty() {
            debug!("frame carries no telemetry fields; ignored");
            return self.status_snapshot();
        }

        let mut merged = None;
        self.status.send_if_modified(|status| {
            let next = apply(status.as_ref(), frame);
            if next == **status {
                return false;
            }
            let next = Arc::new(next);
            merged = Some(Arc::clone(&next));
            *status = next;
            true
        });
        self.last_telemetry.send_replace(Some(self.clock.now()));
        merged.unwrap_or_else(|| self.status_snapshot())
    }

    /// Optimistically show `mode` before the controller confirms it.
    /// The next telemetry frame carrying a mode overrides it.
    pub fn set_mode(&self, mode: Mode) {
        self.status.send_if_modified(|status| {
            if status.mode == mode {
                return false;
            }
            let mut next = (**status).clone();
            next.mode = mode;
            *status = Arc::new(next);
            true
        });
    }

    /// Run an alarm through admission; accepted alarms join the log.
    pub fn offer_alarm(&self, frame: &AlarmFrame) -> Admission {
        let mut admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = admission.admit(frame);
        if let Admission::Accepted(alarm) = &outcome {
            // Logged under the admission lock so log order matches admission order.
            self.alarms.push_newest(Arc::clone(alarm));
        }
        outcome
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn status_snapshot(&self) -> Arc<DeviceStatus> {
        self.status.borrow().clone()
    }

    pub fn alarms_snapshot(&self) -> Arc<Vec<Arc<Alarm>>> {
        self.alarms.snapshot()
    }

    pub fn alarm_count(&self) -> usize {
        self.alarms.len()
    }

    /// When the last telemetry frame was merged, if ever.
    pub fn last_telemetry(&self) -> Option<DateTime<Utc>> {
        *self.last_telemetry.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_status(&self) -> StateStream<DeviceStatus> {
        StateStream::new(self.status.subscribe())
    }

    pub fn subscribe_last_telemetry(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_telemetry.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{FanSpeed, Presence};
    use crate::reconcile::{DEFAULT_ALARM_WINDOW, ManualClock};
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;

    fn store_with_clock() -> (DataStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap());
        let store = DataStore::new(Arc::new(clock.clone()), DEFAULT_ALARM_WINDOW, None);
        (store, clock)
    }

    fn alarm_frame(desc: &str) -> AlarmFrame {
        serde_json::from_value(serde_json::json!({ "alarmDescription": desc })).unwrap()
    }

    #[test]
    fn telemetry_merges_and_stamps() {
        let (store, _clock) = store_with_clock();
        assert!(store.last_telemetry().is_none());

        store.apply_telemetry(&TelemetryFrame {
            temperature: Some(20.5),
            switch_someone_present: Some("on".into()),
            ..TelemetryFrame::default()
        });
        let status = store.apply_telemetry(&TelemetryFrame {
            leds_on: Some(0b011),
            ..TelemetryFrame::default()
        });

        assert_eq!(status.temperature, Some(20.5));
        assert_eq!(status.presence, Presence::Active);
        assert_eq!(status.fan_speed, FanSpeed::from_mask(0b011));
        assert_eq!(*store.status_snapshot(), *status);
        assert!(store.last_telemetry().is_some());
    }

    #[test]
    fn frames_without_telemetry_fields_leave_state_alone() {
        let (store, _clock) = store_with_clock();
        let stream = store.subscribe_status();

        let ack: TelemetryFrame =
            serde_json::from_value(serde_json::json!({ "data": "Response from server" })).unwrap();
        store.apply_telemetry(&ack);

        assert!(!stream.has_changed());
        assert!(store.last_telemetry().is_none());
    }

    #[test]
    fn unchanged_record_does_not_notify() {
        let (store, _clock) = store_with_clock();
        let frame = TelemetryFrame {
            temperature: Some(21.0),
            ..TelemetryFrame::default()
        };
        store.apply_telemetry(&frame);

        let stream = store.subscribe_status();
        store.apply_telemetry(&frame);

        assert!(!stream.has_changed());
        assert!(store.last_telemetry().is_some());
        assert_eq!(stream.latest().temperature, Some(21.0));
    }

    #[test]
    fn optimistic_mode_overridden_by_telemetry() {
        let (store, _clock) = store_with_clock();
        store.set_mode(Mode::AutoPid);
        assert_eq!(store.status_snapshot().mode, Mode::AutoPid);

        store.apply_telemetry(&TelemetryFrame {
            mode: Some("manual".into()),
            ..TelemetryFrame::default()
        });
        assert_eq!(store.status_snapshot().mode, Mode::Manual);
    }

    #[test]
    fn alarm_log_order_after_spaced_alarms() {
        let (store, clock) = store_with_clock();

        store.offer_alarm(&alarm_frame("A"));
        clock.advance(TimeDelta::milliseconds(1500));
        store.offer_alarm(&alarm_frame("B"));
        clock.advance(TimeDelta::milliseconds(1500));
        store.offer_alarm(&alarm_frame("C"));

        let log: Vec<String> = store
            .alarms_snapshot()
            .iter()
            .map(|a| a.description.clone())
            .collect();
        assert_eq!(log, ["C", "B", "A"]);
    }

    #[test]
    fn rejected_alarm_never_logged() {
        let (store, clock) = store_with_clock();

        assert!(matches!(store.offer_alarm(&alarm_frame("A")), Admission::Accepted(_)));
        clock.advance(TimeDelta::milliseconds(1000));
        assert!(matches!(
            store.offer_alarm(&alarm_frame("A again")),
            Admission::Rejected { .. }
        ));
        assert_eq!(store.alarm_count(), 1);
    }

    #[test]
    fn status_subscribers_notified() {
        let (store, _clock) = store_with_clock();
        let mut stream = store.subscribe_status();
        assert_eq!(stream.current().temperature, None);

        store.apply_telemetry(&TelemetryFrame {
            temperature: Some(19.0),
            ..TelemetryFrame::default()
        });
        assert_eq!(stream.latest().temperature, Some(19.0));
        assert!(stream.has_changed());
    }
}
