// ── Status reconciliation ──
//
// Synchronous, non-blocking pieces between the inbound stream and the
// store: decode + route (`classify`), merge (`reducer`), rate-limit
// (`admission`) and the mode vocabulary mapping (`translate`).

pub mod admission;
pub mod classify;
pub mod reducer;
pub mod translate;

pub use admission::{
    Admission, AlarmAdmission, Clock, DEFAULT_ALARM_WINDOW, ManualClock, SystemClock, admits,
};
pub use classify::{DecodeError, Inbound, classify, classify_value};
pub use reducer::apply;
pub use translate::{to_external, to_internal};
