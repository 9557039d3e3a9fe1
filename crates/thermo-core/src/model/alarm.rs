// ── Alarm events ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An alarm accepted by the admission controller. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: Uuid,
    /// When the dashboard accepted it (injected clock).
    pub accepted_at: DateTime<Utc>,
    pub description: String,
    /// Device-local timestamp string, if the controller sent one.
    pub reported_at: Option<String>,
}
