// ── Reactive state store ──
//
// Holds the status record and the alarm log, publishing every change
// through `watch` channels.

mod alarm_log;
mod data_store;

pub use data_store::DataStore;
