//! REST path conventions.
//!
//! Pure string functions with no HTTP dependency. These define the canonical
//! layout of the backend endpoints the scheduler talks to. Paths are relative
//! to the configured base URL.

use uuid::Uuid;

pub const LOGIN: &str = "auth/login";

pub const LOGOUT: &str = "auth/logout";

pub const ASSIGNMENTS: &str = "assignments";

/// Assignments the scheduler still has to look at (status is not `completed`).
pub const ASSIGNMENTS_EVALUABLE: &str = "assignments?evaluable=true";

pub fn assignment(id: Uuid) -> String {
    format!("assignments/{id}")
}

pub fn assignment_completions(id: Uuid) -> String {
    format!("assignments/{id}/completions")
}

/// Conditional occurrence creation, keyed on the assignment's `lastGeneratedAt`.
pub fn assignment_occurrences(id: Uuid) -> String {
    format!("assignments/{id}/occurrences")
}

pub fn completion(id: Uuid) -> String {
    format!("completions/{id}")
}

pub fn completion_answers(id: Uuid) -> String {
    format!("completions/{id}/answers")
}

pub fn completion_missed(id: Uuid) -> String {
    format!("completions/{id}/missed")
}

pub fn completion_read(id: Uuid) -> String {
    format!("completions/{id}/read")
}

pub fn completion_sent(id: Uuid) -> String {
    format!("completions/{id}/sent")
}

pub fn patient_completions(id: Uuid) -> String {
    format!("patients/{id}/completions")
}

pub fn questionnaire(id: Uuid) -> String {
    format!("questionnaires/{id}")
}
