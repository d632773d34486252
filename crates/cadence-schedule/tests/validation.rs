mod common;

use jiff::civil::{date, time};

use cadence_core::models::assignment::FrequencyType;
use cadence_core::models::completion::{Answer, AnswerValue};
use cadence_schedule::answers::{AnswerIssueKind, total_score, validate_answers};
use cadence_schedule::error::ScheduleError;
use cadence_schedule::validate::validate_schedule;

use common::{immediate, mood_check, recurring};

#[test]
fn well_formed_schedule_passes() {
    let assignment = recurring(FrequencyType::Daily, 3, 4, date(2025, 3, 3), date(2025, 3, 3));
    assert!(validate_schedule(&assignment).is_ok());
}

#[test]
fn every_violation_is_reported() {
    let mut assignment = recurring(FrequencyType::Daily, 0, 4, date(2025, 3, 9), date(2025, 3, 3));
    assignment.window_start = time(21, 0, 0, 0);
    assignment.window_end = time(9, 0, 0, 0);
    assignment.deadline_hours = 0;

    let Err(ScheduleError::InvalidSchedule { reasons }) = validate_schedule(&assignment) else {
        panic!("expected an invalid schedule");
    };
    assert_eq!(reasons.len(), 4, "{reasons:?}");
}

#[test]
fn spacing_that_cannot_fit_the_window_is_rejected() {
    // Three occurrences seven hours apart need fourteen hours; the window has twelve.
    let assignment = recurring(FrequencyType::Daily, 3, 7, date(2025, 3, 3), date(2025, 3, 9));
    let err = validate_schedule(&assignment).unwrap_err();
    assert!(err.to_string().contains("do not fit"));

    let weekly = recurring(FrequencyType::Weekly, 3, 7, date(2025, 3, 3), date(2025, 3, 9));
    assert!(validate_schedule(&weekly).is_ok());
}

#[test]
fn immediate_skips_the_spacing_check() {
    let mut assignment = immediate(date(2025, 3, 3), date(2025, 3, 3));
    assignment.frequency_count = 3;
    assignment.min_hours_between = 48;
    assert!(validate_schedule(&assignment).is_ok());
}

#[test]
fn answer_issues_are_classified() {
    let questionnaire = mood_check();
    let answers = vec![
        Answer {
            question_id: "interest".to_string(),
            value: AnswerValue::Text("often".to_string()),
        },
        Answer {
            question_id: "sleep".to_string(),
            value: AnswerValue::Score(1),
        },
        Answer {
            question_id: "down".to_string(),
            value: AnswerValue::Score(2),
        },
        Answer {
            question_id: "down".to_string(),
            value: AnswerValue::Score(3),
        },
        Answer {
            question_id: "notes".to_string(),
            value: AnswerValue::Score(1),
        },
    ];

    let kinds: Vec<_> = validate_answers(&questionnaire, &answers)
        .into_iter()
        .map(|i| (i.question_id, i.kind))
        .collect();

    assert_eq!(
        kinds,
        vec![
            ("interest".to_string(), AnswerIssueKind::WrongKind),
            ("sleep".to_string(), AnswerIssueKind::UnknownQuestion),
            ("down".to_string(), AnswerIssueKind::Duplicate),
            ("notes".to_string(), AnswerIssueKind::WrongKind),
        ]
    );
}

#[test]
fn open_text_may_be_skipped() {
    let questionnaire = mood_check();
    let answers = vec![
        Answer {
            question_id: "interest".to_string(),
            value: AnswerValue::Score(3),
        },
        Answer {
            question_id: "down".to_string(),
            value: AnswerValue::Score(2),
        },
    ];

    assert!(validate_answers(&questionnaire, &answers).is_empty());
    assert_eq!(total_score(&questionnaire, &answers), 5);
}

#[test]
fn scored_question_without_options_accepts_no_score() {
    let mut questionnaire = mood_check();
    questionnaire.questions[0].options.clear();
    let answers = vec![
        Answer {
            question_id: "interest".to_string(),
            value: AnswerValue::Score(i32::MAX),
        },
        Answer {
            question_id: "down".to_string(),
            value: AnswerValue::Score(3),
        },
    ];

    let issues = validate_answers(&questionnaire, &answers);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].question_id, "interest");
    assert_eq!(issues[0].kind, AnswerIssueKind::ScoreNotOffered);
}

#[test]
fn total_score_does_not_overflow() {
    let questionnaire = mood_check();
    let answers = vec![
        Answer {
            question_id: "interest".to_string(),
            value: AnswerValue::Score(i32::MAX),
        },
        Answer {
            question_id: "down".to_string(),
            value: AnswerValue::Score(i32::MAX),
        },
    ];

    assert_eq!(total_score(&questionnaire, &answers), 2 * i64::from(i32::MAX));
}
