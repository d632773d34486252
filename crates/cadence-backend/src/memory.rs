//! In-process backend for tests and local runs.

use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use cadence_core::api_paths;
use cadence_core::models::assignment::{Assignment, AssignmentStatus};
use cadence_core::models::completion::{Completion, CompletionStatus};
use cadence_core::models::questionnaire::Questionnaire;

use crate::backend::{Backend, BoxFuture, OccurrenceWrite};
use crate::error::BackendError;

#[derive(Default)]
struct Store {
    assignments: HashMap<Uuid, Assignment>,
    completions: HashMap<Uuid, Completion>,
    questionnaires: HashMap<Uuid, Questionnaire>,
}

impl Store {
    fn completion_mut(&mut self, id: Uuid) -> Result<&mut Completion, BackendError> {
        self.completions
            .get_mut(&id)
            .ok_or_else(|| BackendError::NotFound {
                path: api_paths::completion(id),
            })
    }
}

/// Maps behind one async mutex. Conditional writes behave like the HTTP
/// backend's: a lost race is a `Conflict`.
#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_questionnaire(&self, questionnaire: Questionnaire) {
        self.store
            .lock()
            .await
            .questionnaires
            .insert(questionnaire.id, questionnaire);
    }

    /// Store an assignment as is, bypassing validation.
    pub async fn insert_assignment(&self, assignment: Assignment) {
        self.store
            .lock()
            .await
            .assignments
            .insert(assignment.id, assignment);
    }

    /// Every stored completion, oldest occurrence first.
    pub async fn completions(&self) -> Vec<Completion> {
        let store = self.store.lock().await;
        let mut all: Vec<Completion> = store.completions.values().cloned().collect();
        all.sort_by_key(|c| (c.scheduled_at, c.id));
        all
    }
}

fn sorted(mut completions: Vec<Completion>) -> Vec<Completion> {
    completions.sort_by_key(|c| (c.scheduled_at, c.id));
    completions
}

impl Backend for MemoryBackend {
    fn evaluable_assignments(&self) -> BoxFuture<'_, Result<Vec<Assignment>, BackendError>> {
        Box::pin(async move {
            let store = self.store.lock().await;
            let mut assignments: Vec<Assignment> = store
                .assignments
                .values()
                .filter(|a| a.status != AssignmentStatus::Completed)
                .cloned()
                .collect();
            assignments.sort_by_key(|a| (a.created_at, a.id));
            Ok(assignments)
        })
    }

    fn assignment(&self, id: Uuid) -> BoxFuture<'_, Result<Assignment, BackendError>> {
        Box::pin(async move {
            let store = self.store.lock().await;
            store
                .assignments
                .get(&id)
                .cloned()
                .ok_or_else(|| BackendError::NotFound {
                    path: api_paths::assignment(id),
                })
        })
    }

    fn create_assignment(
        &self,
        assignment: Assignment,
    ) -> BoxFuture<'_, Result<Assignment, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            if store.assignments.contains_key(&assignment.id) {
                return Err(BackendError::Conflict {
                    path: api_paths::assignment(assignment.id),
                });
            }
            store.assignments.insert(assignment.id, assignment.clone());
            Ok(assignment)
        })
    }

    fn update_assignment(
        &self,
        mut assignment: Assignment,
    ) -> BoxFuture<'_, Result<Assignment, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            let stored = store
                .assignments
                .get_mut(&assignment.id)
                .ok_or_else(|| BackendError::NotFound {
                    path: api_paths::assignment(assignment.id),
                })?;
            assignment.last_generated_at = stored.last_generated_at;
            *stored = assignment.clone();
            Ok(assignment)
        })
    }

    fn create_occurrence(
        &self,
        write: OccurrenceWrite,
    ) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            let assignment_id = write.completion.assignment_id;
            let path = api_paths::assignment_occurrences(assignment_id);

            let Some(assignment) = store.assignments.get(&assignment_id) else {
                return Err(BackendError::NotFound {
                    path: api_paths::assignment(assignment_id),
                });
            };
            if assignment.last_generated_at != write.expected_last_generated_at
                || store.completions.contains_key(&write.completion.id)
            {
                return Err(BackendError::Conflict { path });
            }

            let completion = write.completion;
            store.completions.insert(completion.id, completion.clone());
            if let Some(assignment) = store.assignments.get_mut(&assignment_id) {
                assignment.last_generated_at = Some(completion.scheduled_at);
                assignment.next_scheduled_at = write.next_scheduled_at;
                assignment.updated_at = completion.scheduled_at;
            }
            Ok(completion)
        })
    }

    fn completion(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            store.completion_mut(id).map(|c| c.clone())
        })
    }

    fn assignment_completions(
        &self,
        assignment_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<Completion>, BackendError>> {
        Box::pin(async move {
            let store = self.store.lock().await;
            if !store.assignments.contains_key(&assignment_id) {
                return Err(BackendError::NotFound {
                    path: api_paths::assignment(assignment_id),
                });
            }
            Ok(sorted(
                store
                    .completions
                    .values()
                    .filter(|c| c.assignment_id == assignment_id)
                    .cloned()
                    .collect(),
            ))
        })
    }

    fn patient_completions(
        &self,
        patient_id: Uuid,
    ) -> BoxFuture<'_, Result<Vec<Completion>, BackendError>> {
        Box::pin(async move {
            let store = self.store.lock().await;
            Ok(sorted(
                store
                    .completions
                    .values()
                    .filter(|c| c.patient_id == patient_id)
                    .cloned()
                    .collect(),
            ))
        })
    }

    fn submit_answers(
        &self,
        completion: Completion,
    ) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            let stored = store.completion_mut(completion.id)?;
            if !stored.status.is_outstanding() {
                return Err(BackendError::Conflict {
                    path: api_paths::completion_answers(completion.id),
                });
            }
            *stored = completion.clone();
            Ok(completion)
        })
    }

    fn mark_missed(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            let stored = store.completion_mut(id)?;
            if !stored.status.is_outstanding() {
                return Err(BackendError::Conflict {
                    path: api_paths::completion_missed(id),
                });
            }
            stored.status = CompletionStatus::Missed;
            Ok(stored.clone())
        })
    }

    fn mark_read(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            let stored = store.completion_mut(id)?;
            stored.read_by_therapist = true;
            Ok(stored.clone())
        })
    }

    fn mark_sent(&self, id: Uuid) -> BoxFuture<'_, Result<Completion, BackendError>> {
        Box::pin(async move {
            let mut store = self.store.lock().await;
            let stored = store.completion_mut(id)?;
            match stored.status {
                CompletionStatus::Pending => stored.status = CompletionStatus::Sent,
                CompletionStatus::Sent => {}
                CompletionStatus::Completed | CompletionStatus::Missed => {
                    return Err(BackendError::Conflict {
                        path: api_paths::completion_sent(id),
                    });
                }
            }
            Ok(stored.clone())
        })
    }

    fn questionnaire(&self, id: Uuid) -> BoxFuture<'_, Result<Questionnaire, BackendError>> {
        Box::pin(async move {
            let store = self.store.lock().await;
            store
                .questionnaires
                .get(&id)
                .cloned()
                .ok_or_else(|| BackendError::NotFound {
                    path: api_paths::questionnaire(id),
                })
        })
    }
}
