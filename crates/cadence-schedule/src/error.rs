use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::answers::AnswerIssue;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid schedule: {}", .reasons.join("; "))]
    InvalidSchedule { reasons: Vec<String> },

    #[error("time arithmetic error: {0}")]
    Time(#[from] jiff::Error),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("completion {id} is already completed")]
    AlreadyCompleted { id: Uuid },

    #[error("completion {id} was missed and can no longer be answered")]
    OccurrenceMissed { id: Uuid },

    #[error("completion {id} is not overdue until {deadline}")]
    NotOverdue { id: Uuid, deadline: Timestamp },

    #[error("{} invalid answer(s): {}", .0.len(), summarize(.0))]
    InvalidAnswers(Vec<AnswerIssue>),

    #[error("time arithmetic error: {0}")]
    Time(#[from] jiff::Error),
}

fn summarize(issues: &[AnswerIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
