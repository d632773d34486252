use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Questionnaire {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub questions: Vec<Question>,
    pub created_at: Timestamp,
}

impl Questionnaire {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum QuestionType {
    /// Agreement scale, e.g. "strongly disagree" (0) to "strongly agree" (4).
    Likert,
    /// How often something happened, e.g. "never" (0) to "nearly every day" (3).
    Frequency,
    OpenText,
}

impl QuestionType {
    /// Whether answers carry a score.
    pub fn is_scored(self) -> bool {
        matches!(self, QuestionType::Likert | QuestionType::Frequency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AnswerOption {
    pub label: String,
    pub score: i32,
}
