use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use cadence_core::models::completion::{Answer, AnswerValue};
use cadence_core::models::questionnaire::{QuestionType, Questionnaire};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AnswerIssueKind {
    UnknownQuestion,
    Duplicate,
    /// A scored question was left unanswered.
    Missing,
    /// Text for a scored question, or a score for an open-text question.
    WrongKind,
    /// A score that none of the question's options carry.
    ScoreNotOffered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Error)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
#[error("{message}")]
pub struct AnswerIssue {
    pub question_id: String,
    pub kind: AnswerIssueKind,
    pub message: String,
}

impl AnswerIssue {
    fn new(question_id: &str, kind: AnswerIssueKind, message: String) -> Self {
        Self {
            question_id: question_id.to_string(),
            kind,
            message,
        }
    }
}

/// Check submitted answers against a questionnaire snapshot.
pub fn validate_answers(questionnaire: &Questionnaire, answers: &[Answer]) -> Vec<AnswerIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for answer in answers {
        let id = answer.question_id.as_str();
        let Some(question) = questionnaire.question(id) else {
            issues.push(AnswerIssue::new(
                id,
                AnswerIssueKind::UnknownQuestion,
                format!("{}: no question '{id}'", questionnaire.title),
            ));
            continue;
        };

        if !seen.insert(id) {
            issues.push(AnswerIssue::new(
                id,
                AnswerIssueKind::Duplicate,
                format!("{}: question '{id}' answered more than once", questionnaire.title),
            ));
            continue;
        }

        match (&answer.value, question.question_type) {
            (AnswerValue::Score(score), QuestionType::Likert | QuestionType::Frequency) => {
                if !question.options.iter().any(|o| o.score == *score) {
                    issues.push(AnswerIssue::new(
                        id,
                        AnswerIssueKind::ScoreNotOffered,
                        format!(
                            "{}: score {score} is not an option of '{}'",
                            questionnaire.title, question.text
                        ),
                    ));
                }
            }
            (AnswerValue::Text(_), QuestionType::OpenText) => {}
            (_, expected) => {
                issues.push(AnswerIssue::new(
                    id,
                    AnswerIssueKind::WrongKind,
                    format!(
                        "{}: '{}' expects a {} answer",
                        questionnaire.title,
                        question.text,
                        if expected.is_scored() { "scored" } else { "text" },
                    ),
                ));
            }
        }
    }

    for question in &questionnaire.questions {
        if question.question_type.is_scored() && !seen.contains(question.id.as_str()) {
            issues.push(AnswerIssue::new(
                &question.id,
                AnswerIssueKind::Missing,
                format!("{}: '{}' was not answered", questionnaire.title, question.text),
            ));
        }
    }

    issues
}

/// Sum of the scores given to scored questions. Unknown questions and text
/// answers contribute nothing.
pub fn total_score(questionnaire: &Questionnaire, answers: &[Answer]) -> i64 {
    answers
        .iter()
        .filter_map(|answer| {
            let question = questionnaire.question(&answer.question_id)?;
            match answer.value {
                AnswerValue::Score(score) if question.question_type.is_scored() => {
                    Some(i64::from(score))
                }
                _ => None,
            }
        })
        .sum()
}
