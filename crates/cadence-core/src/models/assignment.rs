use jiff::Timestamp;
use jiff::civil::{Date, Time};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::optional_id;

/// An instruction that a patient must complete a questionnaire on a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Assignment {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[serde(default, deserialize_with = "optional_id::deserialize")]
    pub psychologist_id: Option<Uuid>,
    pub questionnaire_id: Uuid,
    /// First active day, inclusive.
    pub start_date: Date,
    /// Last active day, inclusive.
    pub end_date: Date,
    pub frequency_type: FrequencyType,
    /// Required occurrences per period.
    pub frequency_count: u32,
    #[ts(type = "string")]
    pub window_start: Time,
    #[ts(type = "string")]
    pub window_end: Time,
    pub deadline_hours: u32,
    pub min_hours_between: u32,
    pub status: AssignmentStatus,
    pub assignment_type: AssignmentType,
    pub next_scheduled_at: Option<Timestamp>,
    /// `scheduledAt` of the most recent occurrence. Conditional generation
    /// writes are keyed on this value.
    #[serde(default)]
    pub last_generated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum FrequencyType {
    Daily,
    Weekly,
}

impl FrequencyType {
    /// Length of one scheduling period in days.
    pub fn period_days(self) -> i32 {
        match self {
            FrequencyType::Daily => 1,
            FrequencyType::Weekly => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum AssignmentStatus {
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum AssignmentType {
    /// Exactly one occurrence, issued as soon as the assignment exists.
    Immediate,
    Recurring,
}

/// Request body for creating an assignment. Identity, status and
/// bookkeeping timestamps are filled in by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewAssignment {
    pub patient_id: Uuid,
    #[serde(default, deserialize_with = "optional_id::deserialize")]
    pub psychologist_id: Option<Uuid>,
    pub questionnaire_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub frequency_type: FrequencyType,
    pub frequency_count: u32,
    #[ts(type = "string")]
    pub window_start: Time,
    #[ts(type = "string")]
    pub window_end: Time,
    pub deadline_hours: u32,
    pub min_hours_between: u32,
    pub assignment_type: AssignmentType,
}

impl NewAssignment {
    pub fn into_assignment(self, id: Uuid, now: Timestamp) -> Assignment {
        let next_scheduled_at = match self.assignment_type {
            AssignmentType::Immediate => Some(now),
            AssignmentType::Recurring => None,
        };

        Assignment {
            id,
            patient_id: self.patient_id,
            psychologist_id: self.psychologist_id,
            questionnaire_id: self.questionnaire_id,
            start_date: self.start_date,
            end_date: self.end_date,
            frequency_type: self.frequency_type,
            frequency_count: self.frequency_count,
            window_start: self.window_start,
            window_end: self.window_end,
            deadline_hours: self.deadline_hours,
            min_hours_between: self.min_hours_between,
            status: AssignmentStatus::Active,
            assignment_type: self.assignment_type,
            next_scheduled_at,
            last_generated_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
