// ── Alarm log ──
//
// Newest-first list of accepted alarms with an optional retention cap.
// Every push rebuilds the snapshot that subscribers receive.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::Alarm;

pub(crate) struct AlarmLog {
    retention: Option<usize>,
    snapshot: watch::Sender<Arc<Vec<Arc<Alarm>>>>,
}

impl AlarmLog {
    pub(crate) fn new(retention: Option<usize>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            retention,
            snapshot,
        }
    }

    /// Put `alarm` at the front, dropping the oldest entries past the cap.
    pub(crate) fn push_newest(&self, alarm: Arc<Alarm>) {
        let retention = self.retention;
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let mut next = Vec::with_capacity(snap.len() + 1);
            next.push(alarm);
            next.extend(snap.iter().cloned());
            if let Some(cap) = retention {
                next.truncate(cap);
            }
            *snap = Arc::new(next);
        });
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Alarm>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }
}
