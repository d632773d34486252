//! The scheduler: sweep, submission path, and assignment management.
//!
//! Every operation that touches an assignment or one of its completions runs
//! under that assignment's lock. Across processes the backend's conditional
//! writes arbitrate instead.

use std::sync::Arc;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use cadence_backend::backend::{Backend, OccurrenceWrite};
use cadence_backend::error::BackendError;
use cadence_core::models::assignment::{Assignment, AssignmentStatus, NewAssignment};
use cadence_core::models::completion::{Answer, Completion};
use cadence_core::models::stats::CompletionStats;
use cadence_schedule::answers::total_score;
use cadence_schedule::error::TrackerError;
use cadence_schedule::lifecycle::{self, LifecycleEvent};
use cadence_schedule::occurrence::{Decision, Schedule};
use cadence_schedule::stats::completion_stats;
use cadence_schedule::tracker;
use cadence_schedule::validate::validate_schedule;

use crate::audit::AuditEvent;
use crate::error::ServiceError;
use crate::locks::AssignmentLocks;

/// Actor name used in audit events emitted by the sweep.
pub const SWEEP_ACTOR: &str = "scheduler";

/// What one evaluation did to one assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub assignment_id: Uuid,
    pub generated: Option<Uuid>,
    pub missed: u32,
    pub completed: bool,
    pub next_scheduled_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepFailure {
    pub assignment_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub at: Timestamp,
    pub evaluated: u32,
    pub generated: u32,
    pub missed: u32,
    pub completed: u32,
    pub failures: Vec<SweepFailure>,
}

pub struct Scheduler {
    backend: Arc<dyn Backend>,
    locks: AssignmentLocks,
    tz: TimeZone,
}

impl Scheduler {
    pub fn new(backend: Arc<dyn Backend>, tz: TimeZone) -> Self {
        Self {
            backend,
            locks: AssignmentLocks::new(),
            tz,
        }
    }

    /// One pass over every assignment that is not completed.
    ///
    /// A failing assignment is logged and reported; the others are still
    /// evaluated. Only failing to list the assignments fails the sweep.
    pub async fn sweep(&self, now: Timestamp) -> Result<SweepReport, ServiceError> {
        let assignments = self.backend.evaluable_assignments().await?;
        let mut report = SweepReport {
            at: now,
            ..SweepReport::default()
        };

        for assignment in assignments {
            report.evaluated += 1;
            match self.evaluate(assignment.id, now).await {
                Ok(outcome) => {
                    report.generated += u32::from(outcome.generated.is_some());
                    report.missed += outcome.missed;
                    report.completed += u32::from(outcome.completed);
                }
                Err(e) => {
                    tracing::warn!(
                        assignment_id = %assignment.id,
                        error = %e,
                        "assignment evaluation failed"
                    );
                    report.failures.push(SweepFailure {
                        assignment_id: assignment.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.locks.prune().await;
        tracing::info!(
            evaluated = report.evaluated,
            generated = report.generated,
            missed = report.missed,
            completed = report.completed,
            failed = report.failures.len(),
            "sweep finished"
        );
        Ok(report)
    }

    /// Expire overdue occurrences, generate the next one if due, and apply
    /// the automatic lifecycle transition.
    pub async fn evaluate(&self, id: Uuid, now: Timestamp) -> Result<AssignmentOutcome, ServiceError> {
        let _guard = self.locks.lock(id).await;

        let mut assignment = self.backend.assignment(id).await?;
        let mut completions = self.backend.assignment_completions(id).await?;
        let mut outcome = AssignmentOutcome {
            assignment_id: id,
            generated: None,
            missed: 0,
            completed: false,
            next_scheduled_at: assignment.next_scheduled_at,
        };

        for completion in completions.iter_mut() {
            if !tracker::is_overdue(completion, &assignment, now)? {
                continue;
            }
            let mut expired = completion.clone();
            if !tracker::mark_missed(&mut expired, &assignment, now)? {
                continue;
            }
            match self.backend.mark_missed(completion.id).await {
                Ok(stored) => {
                    *completion = stored;
                    outcome.missed += 1;
                    tracing::info!(
                        assignment_id = %id,
                        completion_id = %completion.id,
                        "occurrence missed"
                    );
                }
                // Answered in the meantime.
                Err(BackendError::Conflict { .. }) => {
                    *completion = self.backend.completion(completion.id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (decision, ended) = {
            let schedule = Schedule::new(&assignment, &self.tz);
            let history: Vec<Timestamp> = completions.iter().map(|c| c.scheduled_at).collect();
            (schedule.evaluate(&history, now)?, schedule.has_ended(now)?)
        };

        // At most one outstanding occurrence per assignment: the next one
        // waits until the current one is answered or missed.
        let decision = match decision {
            Decision::Generate { scheduled_at, .. }
                if completions.iter().any(|c| c.status.is_outstanding()) =>
            {
                Decision::Wait {
                    next_scheduled_at: assignment
                        .next_scheduled_at
                        .map_or(scheduled_at, |t| t.min(scheduled_at)),
                }
            }
            other => other,
        };

        let mut dirty = false;
        let exhausted = match decision {
            Decision::Generate {
                scheduled_at,
                next_scheduled_at,
            } => {
                match self
                    .generate(&assignment, scheduled_at, next_scheduled_at)
                    .await?
                {
                    Some(created) => {
                        assignment.last_generated_at = Some(created.scheduled_at);
                        assignment.next_scheduled_at = next_scheduled_at;
                        outcome.generated = Some(created.id);
                        completions.push(created);
                    }
                    None => return Ok(outcome),
                }
                next_scheduled_at.is_none()
            }
            Decision::Wait { next_scheduled_at } => {
                if assignment.next_scheduled_at != Some(next_scheduled_at) {
                    assignment.next_scheduled_at = Some(next_scheduled_at);
                    assignment.updated_at = now;
                    dirty = true;
                }
                false
            }
            Decision::Exhausted => true,
            Decision::Inactive => false,
        };

        let outstanding = completions.iter().any(|c| c.status.is_outstanding());
        if let Some(event) = lifecycle::automatic_event(assignment.status, ended, exhausted, outstanding) {
            if lifecycle::apply(&mut assignment, event, now) {
                outcome.completed = assignment.status == AssignmentStatus::Completed;
                dirty = true;
                AuditEvent::new("complete_assignment", "assignment", id, SWEEP_ACTOR)
                    .with_details(json!({ "event": format!("{event:?}") }))
                    .emit();
            }
        }

        if dirty {
            assignment = self.backend.update_assignment(assignment).await?;
        }
        outcome.next_scheduled_at = assignment.next_scheduled_at;
        Ok(outcome)
    }

    /// Write a new occurrence. `None` when another writer generated first.
    async fn generate(
        &self,
        assignment: &Assignment,
        scheduled_at: Timestamp,
        next_scheduled_at: Option<Timestamp>,
    ) -> Result<Option<Completion>, ServiceError> {
        let questionnaire = match self.backend.questionnaire(assignment.questionnaire_id).await {
            Ok(questionnaire) => Some(questionnaire),
            Err(e) => {
                tracing::warn!(
                    assignment_id = %assignment.id,
                    questionnaire_id = %assignment.questionnaire_id,
                    error = %e,
                    "questionnaire snapshot unavailable"
                );
                None
            }
        };

        let write = OccurrenceWrite {
            expected_last_generated_at: assignment.last_generated_at,
            completion: Completion::occurrence(Uuid::new_v4(), assignment, scheduled_at, questionnaire),
            next_scheduled_at,
        };

        match self.backend.create_occurrence(write).await {
            Ok(created) => {
                AuditEvent::new("generate_occurrence", "completion", created.id, SWEEP_ACTOR)
                    .with_details(json!({
                        "assignmentId": assignment.id,
                        "scheduledAt": created.scheduled_at,
                        "nextScheduledAt": next_scheduled_at,
                    }))
                    .emit();
                Ok(Some(created))
            }
            Err(BackendError::Conflict { .. }) => {
                tracing::info!(
                    assignment_id = %assignment.id,
                    "occurrence already generated by another writer"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate and store a new assignment, then evaluate it once so that an
    /// immediate assignment gets its single occurrence right away.
    pub async fn create_assignment(
        &self,
        new: NewAssignment,
        actor: &str,
        now: Timestamp,
    ) -> Result<Assignment, ServiceError> {
        let assignment = new.into_assignment(Uuid::new_v4(), now);
        validate_schedule(&assignment)?;

        let created = self.backend.create_assignment(assignment).await?;
        AuditEvent::new("create_assignment", "assignment", created.id, actor)
            .with_details(json!({
                "patientId": created.patient_id,
                "questionnaireId": created.questionnaire_id,
                "assignmentType": created.assignment_type,
            }))
            .emit();

        self.evaluate(created.id, now).await?;
        Ok(self.backend.assignment(created.id).await?)
    }

    pub async fn pause(&self, id: Uuid, actor: &str, now: Timestamp) -> Result<Assignment, ServiceError> {
        self.toggle(id, LifecycleEvent::Pause, actor, now).await
    }

    pub async fn resume(&self, id: Uuid, actor: &str, now: Timestamp) -> Result<Assignment, ServiceError> {
        self.toggle(id, LifecycleEvent::Resume, actor, now).await
    }

    /// Manual pause/resume. Repeating the current state is a no-op.
    async fn toggle(
        &self,
        id: Uuid,
        event: LifecycleEvent,
        actor: &str,
        now: Timestamp,
    ) -> Result<Assignment, ServiceError> {
        let _guard = self.locks.lock(id).await;

        let mut assignment = self.backend.assignment(id).await?;
        if !lifecycle::apply(&mut assignment, event, now) {
            return Ok(assignment);
        }

        let updated = self.backend.update_assignment(assignment).await?;
        AuditEvent::new(format!("{event:?}").to_lowercase(), "assignment", id, actor)
            .with_details(json!({ "status": updated.status }))
            .emit();
        Ok(updated)
    }

    pub async fn assignment(&self, id: Uuid) -> Result<Assignment, ServiceError> {
        Ok(self.backend.assignment(id).await?)
    }

    pub async fn completion(&self, id: Uuid) -> Result<Completion, ServiceError> {
        Ok(self.backend.completion(id).await?)
    }

    /// Record a patient's answers for one occurrence.
    pub async fn submit_answers(
        &self,
        completion_id: Uuid,
        answers: Vec<Answer>,
        actor: &str,
        now: Timestamp,
    ) -> Result<Completion, ServiceError> {
        let assignment_id = self.backend.completion(completion_id).await?.assignment_id;
        let _guard = self.locks.lock(assignment_id).await;

        let mut completion = self.backend.completion(completion_id).await?;
        let assignment = self.backend.assignment(assignment_id).await?;
        if completion.status.is_outstanding() && assignment.status != AssignmentStatus::Active {
            return Err(ServiceError::AssignmentInactive {
                id: assignment.id,
                status: assignment.status,
            });
        }

        tracker::submit_answers(&mut completion, &assignment, answers, now)?;
        let score = completion
            .questionnaire
            .as_ref()
            .map(|q| total_score(q, &completion.answers));

        let stored = match self.backend.submit_answers(completion).await {
            Ok(stored) => stored,
            Err(BackendError::Conflict { .. }) => {
                return Err(TrackerError::AlreadyCompleted { id: completion_id }.into());
            }
            Err(e) => return Err(e.into()),
        };

        AuditEvent::new("submit_answers", "completion", completion_id, actor)
            .with_details(json!({
                "assignmentId": assignment_id,
                "isDelayed": stored.is_delayed,
                "totalScore": score,
            }))
            .emit();
        Ok(stored)
    }

    /// The patient client has displayed the occurrence.
    pub async fn mark_sent(&self, completion_id: Uuid, actor: &str) -> Result<Completion, ServiceError> {
        let mut completion = self.backend.completion(completion_id).await?;
        if !tracker::mark_sent(&mut completion)? {
            return Ok(completion);
        }

        let stored = match self.backend.mark_sent(completion_id).await {
            Ok(stored) => stored,
            // Answered or expired since we read it; report the current state.
            Err(BackendError::Conflict { .. }) => {
                let mut current = self.backend.completion(completion_id).await?;
                tracker::mark_sent(&mut current)?;
                current
            }
            Err(e) => return Err(e.into()),
        };
        AuditEvent::new("mark_sent", "completion", completion_id, actor).emit();
        Ok(stored)
    }

    /// Flag a completion as reviewed. Idempotent.
    pub async fn mark_read(&self, completion_id: Uuid, actor: &str) -> Result<Completion, ServiceError> {
        let mut completion = self.backend.completion(completion_id).await?;
        if !tracker::mark_read(&mut completion) {
            return Ok(completion);
        }

        let stored = self.backend.mark_read(completion_id).await?;
        AuditEvent::new("mark_read", "completion", completion_id, actor).emit();
        Ok(stored)
    }

    pub async fn assignment_completions(&self, assignment_id: Uuid) -> Result<Vec<Completion>, ServiceError> {
        Ok(self.backend.assignment_completions(assignment_id).await?)
    }

    pub async fn patient_stats(&self, patient_id: Uuid) -> Result<CompletionStats, ServiceError> {
        let completions = self.backend.patient_completions(patient_id).await?;
        Ok(completion_stats(&completions))
    }
}
