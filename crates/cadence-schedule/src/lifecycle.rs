//! Assignment status state machine.
//!
//! | from      | event                          | to        |
//! |-----------|--------------------------------|-----------|
//! | active    | pause                          | paused    |
//! | paused    | resume                         | active    |
//! | active    | end date passed / exhausted    | completed |
//! | paused    | end date passed                | completed |
//! | completed | any                            | completed |
//!
//! Anything not in the table leaves the status unchanged.

use jiff::Timestamp;

use cadence_core::models::assignment::{Assignment, AssignmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Pause,
    Resume,
    EndDatePassed,
    /// No further occurrence can be generated.
    Exhausted,
}

pub fn transition(status: AssignmentStatus, event: LifecycleEvent) -> AssignmentStatus {
    use AssignmentStatus::*;
    use LifecycleEvent::*;

    match (status, event) {
        (Active, Pause) => Paused,
        (Paused, Resume) => Active,
        (Active, EndDatePassed | Exhausted) => Completed,
        (Paused, EndDatePassed) => Completed,
        (current, _) => current,
    }
}

/// Apply `event` to the assignment. Returns whether the status changed.
/// Completing an assignment clears its next due time.
pub fn apply(assignment: &mut Assignment, event: LifecycleEvent, now: Timestamp) -> bool {
    let next = transition(assignment.status, event);
    if next == assignment.status {
        return false;
    }

    assignment.status = next;
    assignment.updated_at = now;
    if next == AssignmentStatus::Completed {
        assignment.next_scheduled_at = None;
    }
    true
}

/// The automatic event the sweep should apply, if any.
///
/// An assignment only completes once nothing is left waiting for the
/// patient; outstanding occurrences are resolved by submission or by the
/// deadline sweep first.
pub fn automatic_event(
    status: AssignmentStatus,
    ended: bool,
    exhausted: bool,
    outstanding: bool,
) -> Option<LifecycleEvent> {
    if outstanding {
        return None;
    }
    match status {
        AssignmentStatus::Completed => None,
        _ if ended => Some(LifecycleEvent::EndDatePassed),
        AssignmentStatus::Active if exhausted => Some(LifecycleEvent::Exhausted),
        _ => None,
    }
}
