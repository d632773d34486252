mod common;

use jiff::civil::{date, time};
use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

use cadence_backend::backend::Backend;
use cadence_core::models::assignment::AssignmentStatus;
use cadence_core::models::completion::CompletionStatus;
use cadence_schedule::error::ScheduleError;
use cadence_service::error::ServiceError;

use common::{daily, immediate, scheduler, ts, wellbeing};

#[tokio::test]
async fn past_end_date_completes_without_generating() {
    let (backend, scheduler) = scheduler();
    let mut assignment = daily(1, 0, date(2025, 2, 1), date(2025, 2, 28))
        .into_assignment(Uuid::new_v4(), ts("2025-01-31T12:00:00Z"));
    assignment.next_scheduled_at = Some(ts("2025-02-28T09:00:00Z"));
    backend.insert_assignment(assignment.clone()).await;

    let report = scheduler.sweep(ts("2025-03-10T10:00:00Z")).await.unwrap();

    assert_eq!(report.evaluated, 1);
    assert_eq!(report.generated, 0);
    assert_eq!(report.completed, 1);
    let stored = backend.assignment(assignment.id).await.unwrap();
    assert_eq!(stored.status, AssignmentStatus::Completed);
    assert_eq!(stored.next_scheduled_at, None);
    assert!(backend.completions().await.is_empty());

    // Completed assignments drop out of later sweeps.
    let report = scheduler.sweep(ts("2025-03-10T10:05:00Z")).await.unwrap();
    assert_eq!(report.evaluated, 0);
}

#[tokio::test]
async fn daily_three_per_day_over_one_day() {
    let (backend, scheduler) = scheduler();
    let day = date(2025, 3, 10);
    let new = daily(3, 4, day, day);
    let questionnaire_id = new.questionnaire_id;
    backend.insert_questionnaire(wellbeing(questionnaire_id)).await;

    let created = scheduler
        .create_assignment(new, "psy-1", ts("2025-03-09T12:00:00Z"))
        .await
        .unwrap();
    assert_eq!(created.next_scheduled_at, Some(ts("2025-03-10T09:00:00Z")));

    let mut now = ts("2025-03-10T00:00:00Z");
    let stop = ts("2025-03-11T00:30:00Z");
    let mut missed = 0;
    let mut completed = 0;
    while now < stop {
        let report = scheduler.sweep(now).await.unwrap();
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        missed += report.missed;
        completed += report.completed;
        now = now.checked_add(SignedDuration::from_mins(5)).unwrap();
    }

    let completions = backend.completions().await;
    let times: Vec<Timestamp> = completions.iter().map(|c| c.scheduled_at).collect();
    assert_eq!(
        times,
        vec![
            ts("2025-03-10T09:00:00Z"),
            ts("2025-03-10T13:00:00Z"),
            ts("2025-03-10T17:00:00Z"),
        ]
    );
    for pair in times.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= SignedDuration::from_hours(4));
    }
    for completion in &completions {
        let local = completion.scheduled_at.to_zoned(jiff::tz::TimeZone::UTC).time();
        assert!(local >= time(9, 0, 0, 0) && local <= time(21, 0, 0, 0));
        assert!(completion.questionnaire.is_some());
        assert_eq!(completion.status, CompletionStatus::Missed);
    }

    assert_eq!(missed, 3);
    assert_eq!(completed, 1);
    let stored = backend.assignment(created.id).await.unwrap();
    assert_eq!(stored.status, AssignmentStatus::Completed);
}

#[tokio::test]
async fn next_occurrence_waits_for_the_outstanding_one() {
    let (backend, scheduler) = scheduler();
    let day = date(2025, 3, 10);
    let mut new = daily(3, 4, day, day);
    new.deadline_hours = 24;
    let created = scheduler
        .create_assignment(new, "psy-1", ts("2025-03-09T12:00:00Z"))
        .await
        .unwrap();

    let report = scheduler.sweep(ts("2025-03-10T09:00:00Z")).await.unwrap();
    assert_eq!(report.generated, 1);
    let report = scheduler.sweep(ts("2025-03-10T13:00:00Z")).await.unwrap();
    assert_eq!(report.generated, 0);

    let completions = backend.completions().await;
    let outstanding = completions.iter().filter(|c| c.status.is_outstanding()).count();
    assert_eq!(outstanding, 1);
    let stored = backend.assignment(created.id).await.unwrap();
    assert_eq!(stored.next_scheduled_at, Some(ts("2025-03-10T13:00:00Z")));

    // Once answered, the waiting slot is issued at its due time.
    scheduler
        .submit_answers(completions[0].id, common::valid_answers(), "patient", ts("2025-03-10T13:20:00Z"))
        .await
        .unwrap();
    let report = scheduler.sweep(ts("2025-03-10T13:25:00Z")).await.unwrap();
    assert_eq!(report.generated, 1);
    let times: Vec<Timestamp> = backend
        .completions()
        .await
        .iter()
        .map(|c| c.scheduled_at)
        .collect();
    assert_eq!(times, vec![ts("2025-03-10T09:00:00Z"), ts("2025-03-10T13:00:00Z")]);
}

#[tokio::test]
async fn lagging_sweeps_issue_every_slot_of_a_tight_window() {
    let (backend, scheduler) = scheduler();
    let day = date(2025, 3, 10);
    let mut new = daily(3, 4, day, day);
    new.window_end = time(17, 0, 0, 0);
    scheduler
        .create_assignment(new, "psy-1", ts("2025-03-09T12:00:00Z"))
        .await
        .unwrap();

    let mut now = ts("2025-03-10T08:02:00Z");
    while now < ts("2025-03-11T00:00:00Z") {
        scheduler.sweep(now).await.unwrap();
        now = now.checked_add(SignedDuration::from_mins(5)).unwrap();
    }

    let times: Vec<Timestamp> = backend
        .completions()
        .await
        .iter()
        .map(|c| c.scheduled_at)
        .collect();
    assert_eq!(
        times,
        vec![
            ts("2025-03-10T09:00:00Z"),
            ts("2025-03-10T13:00:00Z"),
            ts("2025-03-10T17:00:00Z"),
        ]
    );
}

#[tokio::test]
async fn immediate_generates_once_at_creation() {
    let (backend, scheduler) = scheduler();
    let new = immediate(date(2025, 3, 10), date(2025, 3, 20));
    backend.insert_questionnaire(wellbeing(new.questionnaire_id)).await;

    // Outside the 09:00-21:00 window.
    let now = ts("2025-03-10T23:30:00Z");
    let created = scheduler.create_assignment(new, "psy-1", now).await.unwrap();

    let completions = backend.completions().await;
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].scheduled_at, now);
    assert_eq!(created.last_generated_at, Some(now));
    assert_eq!(created.next_scheduled_at, None);

    // Outstanding, so the assignment stays active.
    let report = scheduler.sweep(ts("2025-03-10T23:35:00Z")).await.unwrap();
    assert_eq!(report.generated, 0);
    assert_eq!(report.completed, 0);

    scheduler
        .submit_answers(
            completions[0].id,
            common::valid_answers(),
            "patient",
            ts("2025-03-10T23:50:00Z"),
        )
        .await
        .unwrap();

    let report = scheduler.sweep(ts("2025-03-10T23:55:00Z")).await.unwrap();
    assert_eq!(report.generated, 0);
    assert_eq!(report.completed, 1);
    assert_eq!(backend.completions().await.len(), 1);
}

#[tokio::test]
async fn one_bad_assignment_does_not_stop_the_sweep() {
    let (backend, scheduler) = scheduler();
    let now = ts("2025-03-10T09:00:00Z");

    let mut broken = daily(1, 0, date(2025, 3, 10), date(2025, 3, 12))
        .into_assignment(Uuid::new_v4(), ts("2025-03-01T00:00:00Z"));
    broken.window_start = time(18, 0, 0, 0);
    broken.window_end = time(8, 0, 0, 0);
    backend.insert_assignment(broken.clone()).await;

    let healthy = daily(1, 0, date(2025, 3, 10), date(2025, 3, 12))
        .into_assignment(Uuid::new_v4(), ts("2025-03-02T00:00:00Z"));
    backend.insert_assignment(healthy.clone()).await;

    let report = scheduler.sweep(now).await.unwrap();

    assert_eq!(report.evaluated, 2);
    assert_eq!(report.generated, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].assignment_id, broken.id);
    assert!(report.failures[0].error.contains("window"), "{}", report.failures[0].error);

    let completions = backend.assignment_completions(healthy.id).await.unwrap();
    assert_eq!(completions.len(), 1);
    // No questionnaire was seeded; the occurrence is still created.
    assert!(completions[0].questionnaire.is_none());
}

#[tokio::test]
async fn invalid_schedule_is_rejected_at_creation() {
    let (backend, scheduler) = scheduler();
    let new = daily(4, 5, date(2025, 3, 12), date(2025, 3, 10));

    let err = scheduler
        .create_assignment(new, "psy-1", ts("2025-03-09T12:00:00Z"))
        .await
        .unwrap_err();

    match err {
        ServiceError::Schedule(ScheduleError::InvalidSchedule { reasons }) => {
            assert_eq!(reasons.len(), 2, "{reasons:?}");
        }
        other => panic!("expected InvalidSchedule, got {other}"),
    }
    assert!(backend.evaluable_assignments().await.unwrap().is_empty());
}

#[tokio::test]
async fn paused_assignment_generates_nothing_until_resumed() {
    let (backend, scheduler) = scheduler();
    let created = scheduler
        .create_assignment(
            daily(1, 0, date(2025, 3, 10), date(2025, 3, 12)),
            "psy-1",
            ts("2025-03-09T12:00:00Z"),
        )
        .await
        .unwrap();

    let paused = scheduler
        .pause(created.id, "psy-1", ts("2025-03-09T13:00:00Z"))
        .await
        .unwrap();
    assert_eq!(paused.status, AssignmentStatus::Paused);
    // Pausing twice is a no-op.
    let again = scheduler
        .pause(created.id, "psy-1", ts("2025-03-09T14:00:00Z"))
        .await
        .unwrap();
    assert_eq!(again.updated_at, ts("2025-03-09T13:00:00Z"));

    let report = scheduler.sweep(ts("2025-03-10T10:00:00Z")).await.unwrap();
    assert_eq!(report.generated, 0);
    assert!(backend.completions().await.is_empty());

    scheduler
        .resume(created.id, "psy-1", ts("2025-03-10T10:30:00Z"))
        .await
        .unwrap();
    let report = scheduler.sweep(ts("2025-03-10T10:35:00Z")).await.unwrap();
    assert_eq!(report.generated, 1);
}

#[tokio::test]
async fn paused_assignment_completes_after_end_date() {
    let (backend, scheduler) = scheduler();
    let created = scheduler
        .create_assignment(
            daily(1, 0, date(2025, 3, 10), date(2025, 3, 12)),
            "psy-1",
            ts("2025-03-09T12:00:00Z"),
        )
        .await
        .unwrap();
    scheduler
        .pause(created.id, "psy-1", ts("2025-03-09T13:00:00Z"))
        .await
        .unwrap();

    let report = scheduler.sweep(ts("2025-03-13T00:00:00Z")).await.unwrap();
    assert_eq!(report.completed, 1);
    let stored = backend.assignment(created.id).await.unwrap();
    assert_eq!(stored.status, AssignmentStatus::Completed);
}

#[tokio::test]
async fn unknown_assignment_is_not_found() {
    let (_backend, scheduler) = scheduler();
    let err = scheduler
        .pause(Uuid::new_v4(), "psy-1", ts("2025-03-09T13:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
