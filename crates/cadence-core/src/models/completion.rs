use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::assignment::Assignment;
use super::questionnaire::Questionnaire;

/// The record of a patient's response (or non-response) to one occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Completion {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub patient_id: Uuid,
    pub questionnaire_id: Uuid,
    /// When the occurrence became due.
    pub scheduled_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub is_delayed: bool,
    pub status: CompletionStatus,
    #[serde(default)]
    pub read_by_therapist: bool,
    /// Questionnaire as it was when the occurrence was generated.
    #[serde(default)]
    pub questionnaire: Option<Questionnaire>,
}

impl Completion {
    /// A fresh, unanswered occurrence of `assignment`.
    pub fn occurrence(
        id: Uuid,
        assignment: &Assignment,
        scheduled_at: Timestamp,
        questionnaire: Option<Questionnaire>,
    ) -> Self {
        Self {
            id,
            assignment_id: assignment.id,
            patient_id: assignment.patient_id,
            questionnaire_id: assignment.questionnaire_id,
            scheduled_at,
            completed_at: None,
            answers: Vec::new(),
            is_delayed: false,
            status: CompletionStatus::Pending,
            read_by_therapist: false,
            questionnaire,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
}

/// Likert and frequency questions are answered with the chosen option's
/// score, open-text questions with free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum AnswerValue {
    Score(i32),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CompletionStatus {
    Pending,
    Sent,
    Completed,
    Missed,
}

impl CompletionStatus {
    /// Still waiting for the patient.
    pub fn is_outstanding(self) -> bool {
        matches!(self, CompletionStatus::Pending | CompletionStatus::Sent)
    }
}
