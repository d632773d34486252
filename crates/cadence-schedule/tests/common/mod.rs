#![allow(dead_code)]

use jiff::Timestamp;
use jiff::civil::{Date, time};
use uuid::Uuid;

use cadence_core::models::assignment::{
    Assignment, AssignmentStatus, AssignmentType, FrequencyType,
};
use cadence_core::models::completion::Completion;
use cadence_core::models::questionnaire::{AnswerOption, Question, QuestionType, Questionnaire};

pub fn ts(s: &str) -> Timestamp {
    s.parse().expect("valid timestamp")
}

pub fn recurring(
    frequency_type: FrequencyType,
    frequency_count: u32,
    min_hours_between: u32,
    start_date: Date,
    end_date: Date,
) -> Assignment {
    Assignment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        psychologist_id: None,
        questionnaire_id: Uuid::new_v4(),
        start_date,
        end_date,
        frequency_type,
        frequency_count,
        window_start: time(9, 0, 0, 0),
        window_end: time(21, 0, 0, 0),
        deadline_hours: 2,
        min_hours_between,
        status: AssignmentStatus::Active,
        assignment_type: AssignmentType::Recurring,
        next_scheduled_at: None,
        last_generated_at: None,
        created_at: ts("2025-03-01T00:00:00Z"),
        updated_at: ts("2025-03-01T00:00:00Z"),
    }
}

pub fn immediate(start_date: Date, end_date: Date) -> Assignment {
    Assignment {
        assignment_type: AssignmentType::Immediate,
        ..recurring(FrequencyType::Daily, 1, 0, start_date, end_date)
    }
}

pub fn occurrence(assignment: &Assignment, scheduled_at: Timestamp) -> Completion {
    Completion::occurrence(Uuid::new_v4(), assignment, scheduled_at, None)
}

/// PHQ-style mood check: two frequency items and a free-text note.
pub fn mood_check() -> Questionnaire {
    let frequency_options = ["Not at all", "Several days", "More than half the days", "Nearly every day"]
        .iter()
        .enumerate()
        .map(|(score, label)| AnswerOption {
            label: label.to_string(),
            score: score as i32,
        })
        .collect::<Vec<_>>();

    Questionnaire {
        id: Uuid::new_v4(),
        title: "Mood check".to_string(),
        icon: Some("sun".to_string()),
        questions: vec![
            Question {
                id: "interest".to_string(),
                text: "Little interest or pleasure in doing things".to_string(),
                question_type: QuestionType::Frequency,
                options: frequency_options.clone(),
            },
            Question {
                id: "down".to_string(),
                text: "Feeling down, depressed, or hopeless".to_string(),
                question_type: QuestionType::Frequency,
                options: frequency_options,
            },
            Question {
                id: "notes".to_string(),
                text: "Anything else you want to share?".to_string(),
                question_type: QuestionType::OpenText,
                options: Vec::new(),
            },
        ],
        created_at: ts("2025-01-01T00:00:00Z"),
    }
}
