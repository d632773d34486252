#![allow(dead_code)]

use std::sync::Arc;

use jiff::Timestamp;
use jiff::civil::{Date, time};
use jiff::tz::TimeZone;
use uuid::Uuid;

use cadence_backend::backend::Backend;
use cadence_backend::memory::MemoryBackend;
use cadence_core::models::assignment::{AssignmentType, FrequencyType, NewAssignment};
use cadence_core::models::completion::{Answer, AnswerValue};
use cadence_core::models::questionnaire::{AnswerOption, Question, QuestionType, Questionnaire};
use cadence_service::scheduler::Scheduler;

pub fn ts(s: &str) -> Timestamp {
    s.parse().expect("valid timestamp")
}

pub fn scheduler() -> (Arc<MemoryBackend>, Scheduler) {
    let backend = Arc::new(MemoryBackend::new());
    let shared: Arc<dyn Backend> = backend.clone();
    (backend, Scheduler::new(shared, TimeZone::UTC))
}

/// Two scored items and a free-text note.
pub fn wellbeing(id: Uuid) -> Questionnaire {
    let options: Vec<AnswerOption> = ["Never", "Sometimes", "Often", "Always"]
        .iter()
        .enumerate()
        .map(|(score, label)| AnswerOption {
            label: label.to_string(),
            score: score as i32,
        })
        .collect();

    Questionnaire {
        id,
        title: "Weekly wellbeing".to_string(),
        icon: None,
        questions: vec![
            Question {
                id: "sleep".to_string(),
                text: "I slept badly".to_string(),
                question_type: QuestionType::Likert,
                options: options.clone(),
            },
            Question {
                id: "worry".to_string(),
                text: "I worried a lot".to_string(),
                question_type: QuestionType::Frequency,
                options,
            },
            Question {
                id: "notes".to_string(),
                text: "Anything else?".to_string(),
                question_type: QuestionType::OpenText,
                options: Vec::new(),
            },
        ],
        created_at: ts("2025-01-01T00:00:00Z"),
    }
}

pub fn valid_answers() -> Vec<Answer> {
    vec![
        Answer {
            question_id: "sleep".to_string(),
            value: AnswerValue::Score(2),
        },
        Answer {
            question_id: "worry".to_string(),
            value: AnswerValue::Score(1),
        },
        Answer {
            question_id: "notes".to_string(),
            value: AnswerValue::Text("busy week".to_string()),
        },
    ]
}

pub fn daily(frequency_count: u32, min_hours_between: u32, start: Date, end: Date) -> NewAssignment {
    NewAssignment {
        patient_id: Uuid::new_v4(),
        psychologist_id: None,
        questionnaire_id: Uuid::new_v4(),
        start_date: start,
        end_date: end,
        frequency_type: FrequencyType::Daily,
        frequency_count,
        window_start: time(9, 0, 0, 0),
        window_end: time(21, 0, 0, 0),
        deadline_hours: 2,
        min_hours_between,
        assignment_type: AssignmentType::Recurring,
    }
}

pub fn immediate(start: Date, end: Date) -> NewAssignment {
    NewAssignment {
        assignment_type: AssignmentType::Immediate,
        ..daily(1, 0, start, end)
    }
}
