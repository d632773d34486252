use std::future::Future;
use std::pin::Pin;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::models::assignment::Assignment;
use cadence_core::models::completion::Completion;
use cadence_core::models::questionnaire::Questionnaire;

use crate::error::BackendError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A new occurrence, written only if the assignment's `lastGeneratedAt` is
/// still what the writer observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceWrite {
    pub expected_last_generated_at: Option<Timestamp>,
    pub completion: Completion,
    pub next_scheduled_at: Option<Timestamp>,
}

/// The persistence collaborator the scheduler is driven through.
///
/// Writes that can race (occurrence creation, submission, missing) are
/// conditional and fail with `BackendError::Conflict` when another writer got
/// there first.
///
/// Methods return boxed futures for dyn compatibility.
pub trait Backend: Send + Sync {
    /// Assignments the sweep still has to look at (not completed).
    fn evaluable_assignments(&self) -> BoxFuture<'_, Result<Vec<Assignment>, BackendError>>;

    fn assignment(&self, id: Uuid) -> BoxFuture<'_, Result<Assignment, BackendError>>;

    fn create_assignment(
        &self,
        assignment: Assignment,
    ) -> BoxFuture<'_, Result<Assignment, BackendError>>;

    /// Persist status / next due time. `lastGeneratedAt` is owned by
    /// [`Backend::create_occurrence`] and is not overwritten here.
    fn update_assignment(
        &self,
        assignment: Assignment,
    ) -> BoxFuture<'_, Result<Assignment, BackendError>>;

    /// Store a generated occurrence and advance the assignment in one
    /// conditional write.
    fn create_occurrence(
        &self,
        write: OccurrenceWrite,
    ) -> BoxFuture<'_, Result<Completion, BackendError>>;

    fn completion(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>>;

    fn assignment_completions(
        &self,
        assignment_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<Completion>, BackendError>>;

    fn patient_completions(
        &self,
        patient_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<Completion>, BackendError>>;

    /// Store an answered completion. Rejected unless the stored record is
    /// still pending or sent.
    fn submit_answers(
        &self,
        completion: Completion,
    ) -> BoxFuture<'_, Result<Completion, BackendError>>;

    /// Pending/sent → missed. Rejected for any other stored status.
    fn mark_missed(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>>;

    fn mark_read(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>>;

    /// Pending → sent. Already sent is accepted as is.
    fn mark_sent(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>>;

    fn questionnaire(&self, id: Uuid) -> BoxFuture<'_, Result<Questionnaire, BackendError>>;
}
