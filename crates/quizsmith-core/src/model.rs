//! Core data model types for quizsmith.
//!
//! These are the canonical shapes every other module works with. Instances
//! of [`Quiz`] are only ever produced by the normalizer, so the invariants
//! documented on each type hold everywhere downstream.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::proctor::ProctorSummary;

/// Number of options every multiple-choice question carries.
pub const MCQ_OPTION_COUNT: usize = 4;

/// Inclusive bounds for question points.
pub const MIN_POINTS: u32 = 1;
pub const MAX_POINTS: u32 = 10;

/// A titled collection of questions. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// The canonical single-question quiz used when nothing else is available.
    pub fn sample() -> Self {
        Self {
            title: "Sample Quiz".to_string(),
            description: "A starter quiz. Generate or upload your own to replace it.".to_string(),
            questions: vec![Question::sample()],
        }
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Sum of points over all questions.
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

/// One assessment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    /// The question text.
    pub q: String,
    pub level: Level,
    /// Always within `MIN_POINTS..=MAX_POINTS`.
    pub points: u32,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    /// The default multiple-choice question substituted into an empty quiz.
    pub fn sample() -> Self {
        Self {
            id: "q1".to_string(),
            q: "Which keyword declares an immutable variable binding in Rust?".to_string(),
            level: Level::Easy,
            points: Level::Easy.default_points(),
            kind: QuestionKind::Mcq {
                options: [
                    "let".to_string(),
                    "var".to_string(),
                    "const mut".to_string(),
                    "static mut".to_string(),
                ],
                correct_index: 0,
            },
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::Mcq { .. } => QuestionType::Mcq,
            QuestionKind::Text { .. } => QuestionType::Text,
            QuestionKind::Code { .. } => QuestionType::Code,
        }
    }

    /// The `"<type>-<level>"` tag used for weak-area reporting.
    pub fn weak_area_tag(&self) -> String {
        format!("{}-{}", self.question_type(), self.level)
    }
}

/// Per-variant payload of a question, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq {
        options: [String; MCQ_OPTION_COUNT],
        /// Always within `0..MCQ_OPTION_COUNT`.
        #[serde(rename = "correctIndex")]
        correct_index: usize,
    },
    Text {
        #[serde(default)]
        keywords: Vec<String>,
    },
    Code {
        #[serde(rename = "starterCode", default, skip_serializing_if = "Option::is_none")]
        starter_code: Option<String>,
        #[serde(rename = "expectedKeyPoints", default)]
        expected_key_points: Vec<String>,
    },
}

/// The three question variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Text,
    Code,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "mcq"),
            QuestionType::Text => write!(f, "text"),
            QuestionType::Code => write!(f, "code"),
        }
    }
}

impl QuestionType {
    /// Lenient parse; anything unrecognized is treated as free text.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mcq" => QuestionType::Mcq,
            "code" => QuestionType::Code,
            _ => QuestionType::Text,
        }
    }
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Easy => write!(f, "easy"),
            Level::Medium => write!(f, "medium"),
            Level::Hard => write!(f, "hard"),
        }
    }
}

impl Level {
    /// Lenient parse; anything unrecognized is `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Level::Easy,
            "hard" => Level::Hard,
            _ => Level::Medium,
        }
    }

    /// Points awarded to a question of this level when none are given.
    pub fn default_points(self) -> u32 {
        match self {
            Level::Easy => 1,
            Level::Medium => 2,
            Level::Hard => 3,
        }
    }
}

/// A learner's submitted value for one question.
///
/// MCQ answers are option indices; text and code answers are free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(i64),
    Text(String),
}

impl AnswerValue {
    /// Read one answer from loosely typed JSON.
    ///
    /// Integers and integral floats are choices, strings are text, other
    /// numbers keep their textual form. `null`, booleans, arrays and objects
    /// carry no answer.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(AnswerValue::Choice(i));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Some(AnswerValue::Choice(f as i64))
                    }
                    _ => Some(AnswerValue::Text(n.to_string())),
                }
            }
            Value::String(s) => Some(AnswerValue::Text(s.clone())),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The selected option index, if this value names one.
    pub fn as_choice(&self) -> Option<i64> {
        match self {
            AnswerValue::Choice(i) => Some(*i),
            AnswerValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            AnswerValue::Choice(i) => i.to_string(),
            AnswerValue::Text(s) => s.clone(),
        }
    }
}

/// The graded outcome for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub value: Option<AnswerValue>,
    /// `None` when the question had nothing to grade against.
    pub correct: Option<bool>,
    pub points_awarded: u32,
}

/// An immutable record of one graded session.
///
/// Only constructed at the grading transition; a retake produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    quiz_title: String,
    score: u32,
    total_questions: usize,
    duration_sec: u64,
    weak_areas: Vec<String>,
    proctor_summary: ProctorSummary,
}

impl Attempt {
    pub fn new(
        quiz_title: String,
        score: u32,
        total_questions: usize,
        duration_sec: u64,
        weak_areas: Vec<String>,
        proctor_summary: ProctorSummary,
    ) -> Self {
        Self {
            quiz_title,
            score: score.min(100),
            total_questions,
            duration_sec,
            weak_areas,
            proctor_summary,
        }
    }

    pub fn quiz_title(&self) -> &str {
        &self.quiz_title
    }

    /// Percentage score, 0–100.
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    pub fn duration_sec(&self) -> u64 {
        self.duration_sec
    }

    pub fn weak_areas(&self) -> &[String] {
        &self.weak_areas
    }

    pub fn proctor_summary(&self) -> &ProctorSummary {
        &self.proctor_summary
    }
}
