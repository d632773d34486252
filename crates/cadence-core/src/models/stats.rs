use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Aggregate completion counts consumed by reporting views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompletionStats {
    pub total: u32,
    pub on_time: u32,
    pub late: u32,
    pub missed: u32,
    /// Pending or sent, still waiting for the patient.
    pub outstanding: u32,
    /// Completed or missed, not yet reviewed by the therapist.
    pub unread: u32,
}
