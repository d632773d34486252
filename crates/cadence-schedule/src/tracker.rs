//! Completion tracking: answers, lateness and read-state per occurrence.
//!
//! This is the only place lateness is computed. A completion is late when it
//! is answered strictly after `scheduled_at + deadline_hours`; answering
//! exactly at the deadline is on time.

use jiff::{SignedDuration, Timestamp};

use cadence_core::models::assignment::Assignment;
use cadence_core::models::completion::{Answer, Completion, CompletionStatus};

use crate::answers::validate_answers;
use crate::error::TrackerError;

/// The instant after which an unanswered occurrence counts as missed.
pub fn deadline_of(completion: &Completion, assignment: &Assignment) -> Result<Timestamp, TrackerError> {
    let window = SignedDuration::from_hours(i64::from(assignment.deadline_hours));
    Ok(completion.scheduled_at.checked_add(window)?)
}

pub fn is_delayed(
    completion: &Completion,
    assignment: &Assignment,
    answered_at: Timestamp,
) -> Result<bool, TrackerError> {
    Ok(answered_at > deadline_of(completion, assignment)?)
}

/// Outstanding and past its deadline.
pub fn is_overdue(
    completion: &Completion,
    assignment: &Assignment,
    now: Timestamp,
) -> Result<bool, TrackerError> {
    Ok(completion.status.is_outstanding() && now > deadline_of(completion, assignment)?)
}

/// Record the patient's answers.
///
/// Answers are checked against the questionnaire snapshot when the
/// occurrence carries one.
pub fn submit_answers(
    completion: &mut Completion,
    assignment: &Assignment,
    answers: Vec<Answer>,
    now: Timestamp,
) -> Result<(), TrackerError> {
    match completion.status {
        CompletionStatus::Completed => {
            return Err(TrackerError::AlreadyCompleted { id: completion.id });
        }
        CompletionStatus::Missed => {
            return Err(TrackerError::OccurrenceMissed { id: completion.id });
        }
        CompletionStatus::Pending | CompletionStatus::Sent => {}
    }

    if let Some(questionnaire) = &completion.questionnaire {
        let issues = validate_answers(questionnaire, &answers);
        if !issues.is_empty() {
            return Err(TrackerError::InvalidAnswers(issues));
        }
    }

    completion.is_delayed = is_delayed(completion, assignment, now)?;
    completion.completed_at = Some(now);
    completion.answers = answers;
    completion.status = CompletionStatus::Completed;
    Ok(())
}

/// Close an unanswered occurrence whose deadline has passed.
///
/// Returns `false` when it was already missed.
pub fn mark_missed(
    completion: &mut Completion,
    assignment: &Assignment,
    now: Timestamp,
) -> Result<bool, TrackerError> {
    match completion.status {
        CompletionStatus::Completed => Err(TrackerError::AlreadyCompleted { id: completion.id }),
        CompletionStatus::Missed => Ok(false),
        CompletionStatus::Pending | CompletionStatus::Sent => {
            let deadline = deadline_of(completion, assignment)?;
            if now <= deadline {
                return Err(TrackerError::NotOverdue {
                    id: completion.id,
                    deadline,
                });
            }
            completion.status = CompletionStatus::Missed;
            Ok(true)
        }
    }
}

/// Flag the occurrence as reviewed by the therapist. Idempotent; returns
/// whether anything changed.
pub fn mark_read(completion: &mut Completion) -> bool {
    let changed = !completion.read_by_therapist;
    completion.read_by_therapist = true;
    changed
}

/// The patient client has displayed the occurrence.
pub fn mark_sent(completion: &mut Completion) -> Result<bool, TrackerError> {
    match completion.status {
        CompletionStatus::Pending => {
            completion.status = CompletionStatus::Sent;
            Ok(true)
        }
        CompletionStatus::Sent => Ok(false),
        CompletionStatus::Completed => Err(TrackerError::AlreadyCompleted { id: completion.id }),
        CompletionStatus::Missed => Err(TrackerError::OccurrenceMissed { id: completion.id }),
    }
}
