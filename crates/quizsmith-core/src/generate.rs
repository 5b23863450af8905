//! AI-backed quiz generation.
//!
//! One provider call, then extraction and normalization. Any failure is
//! surfaced to the caller; a generation request never silently falls back
//! to a sample quiz.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{NormalizeError, QuizError};
use crate::extract::{excerpt, extract_json};
use crate::model::Quiz;
use crate::normalize::normalize_quiz;
use crate::traits::{AiProvider, CompletionOptions};

pub const MIN_QUESTION_COUNT: u32 = 1;
pub const MAX_QUESTION_COUNT: u32 = 15;

/// How much of the raw AI text is echoed back in diagnostics.
const EXCERPT_CHARS: usize = 300;

/// Which question types the generated quiz should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionTypeMix {
    #[default]
    Mixed,
    Mcq,
    Text,
    Code,
}

/// Which difficulty the generated quiz should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyMix {
    #[default]
    Mixed,
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for QuestionTypeMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionTypeMix::Mixed => write!(f, "mixed"),
            QuestionTypeMix::Mcq => write!(f, "mcq"),
            QuestionTypeMix::Text => write!(f, "text"),
            QuestionTypeMix::Code => write!(f, "code"),
        }
    }
}

impl FromStr for QuestionTypeMix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mixed" => Ok(QuestionTypeMix::Mixed),
            "mcq" => Ok(QuestionTypeMix::Mcq),
            "text" => Ok(QuestionTypeMix::Text),
            "code" => Ok(QuestionTypeMix::Code),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

impl fmt::Display for DifficultyMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyMix::Mixed => write!(f, "mixed"),
            DifficultyMix::Easy => write!(f, "easy"),
            DifficultyMix::Medium => write!(f, "medium"),
            DifficultyMix::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for DifficultyMix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mixed" => Ok(DifficultyMix::Mixed),
            "easy" => Ok(DifficultyMix::Easy),
            "medium" => Ok(DifficultyMix::Medium),
            "hard" => Ok(DifficultyMix::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A request to generate a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub question_type: QuestionTypeMix,
    #[serde(default)]
    pub difficulty: DifficultyMix,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Source code the questions should be about.
    #[serde(default)]
    pub context_code: Option<String>,
    #[serde(default = "default_output_language")]
    pub output_language: String,
}

fn default_count() -> u32 {
    5
}

fn default_output_language() -> String {
    "English".to_string()
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            question_type: QuestionTypeMix::default(),
            difficulty: DifficultyMix::default(),
            count: default_count(),
            context_code: None,
            output_language: default_output_language(),
        }
    }

    /// Requires a topic or context code.
    pub fn validate(&self) -> Result<(), QuizError> {
        let has_code = self
            .context_code
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if self.topic.trim().is_empty() && !has_code {
            return Err(QuizError::BadRequest(
                "either a topic or context code is required".to_string(),
            ));
        }
        Ok(())
    }

    /// The requested count clamped to the supported range.
    pub fn effective_count(&self) -> u32 {
        self.count.clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT)
    }
}

/// Render the user prompt for a generation request.
///
/// Providers send [`crate::traits::QUIZ_SYSTEM_PROMPT`] alongside it.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let count = request.effective_count();
    let mut prompt = String::new();

    let topic = request.topic.trim();
    if topic.is_empty() {
        prompt.push_str(&format!("Write a quiz of {count} questions about the code below.\n"));
    } else {
        prompt.push_str(&format!("Write a quiz of {count} questions about: {topic}\n"));
    }

    match request.question_type {
        QuestionTypeMix::Mixed => prompt.push_str(
            "Mix question types: multiple choice (\"mcq\"), short answer (\"text\") and coding (\"code\").\n",
        ),
        other => prompt.push_str(&format!("Every question must have type \"{other}\".\n")),
    }
    match request.difficulty {
        DifficultyMix::Mixed => {
            prompt.push_str("Spread difficulty across \"easy\", \"medium\" and \"hard\".\n")
        }
        other => prompt.push_str(&format!("Every question must have level \"{other}\".\n")),
    }
    prompt.push_str(&format!(
        "Write all titles, questions, options and keywords in {}.\n\n",
        request.output_language.trim()
    ));

    if let Some(code) = request
        .context_code
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        prompt.push_str("Context code:\n```\n");
        prompt.push_str(code.trim_end());
        prompt.push_str("\n```\n\n");
    }

    prompt.push_str(SCHEMA_HINT);
    prompt
}

const SCHEMA_HINT: &str = r#"Respond with JSON of exactly this shape:
{
  "title": "string",
  "description": "string",
  "questions": [
    {"id": "q1", "type": "mcq", "q": "string", "level": "easy|medium|hard", "points": 1,
     "options": ["A", "B", "C", "D"], "correctIndex": 0},
    {"id": "q2", "type": "text", "q": "string", "level": "medium", "points": 2,
     "keywords": ["lowercase", "terms", "a", "good", "answer", "mentions"]},
    {"id": "q3", "type": "code", "q": "string", "level": "hard", "points": 3,
     "starterCode": "optional starter code", "expectedKeyPoints": ["substrings", "a", "solution", "contains"]}
  ]
}
Multiple choice questions have exactly 4 options. Points are between 1 and 10."#;

/// Generates quizzes through an [`AiProvider`].
pub struct QuizGenerator {
    provider: Arc<dyn AiProvider>,
    options: CompletionOptions,
}

impl QuizGenerator {
    pub fn new(provider: Arc<dyn AiProvider>, options: CompletionOptions) -> Self {
        Self { provider, options }
    }

    /// Run one generation request end to end.
    #[instrument(skip(self, request), fields(provider = self.provider.name(), count = request.effective_count()))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Quiz, QuizError> {
        request.validate()?;

        let prompt = build_prompt(request);
        let raw = self.provider.complete(&prompt, &self.options).await?;

        let value = extract_json(&raw).map_err(|e| {
            tracing::warn!("AI response contained no JSON");
            QuizError::InvalidAiOutput {
                message: e.to_string(),
                excerpt: excerpt(&raw, EXCERPT_CHARS),
            }
        })?;

        let max = request.effective_count() as usize;
        let quiz = normalize_quiz(&value, Some(max)).map_err(|NormalizeError::EmptyQuiz| {
            tracing::warn!("AI response normalized to an empty quiz");
            QuizError::InvalidAiOutput {
                message: NormalizeError::EmptyQuiz.to_string(),
                excerpt: excerpt(&raw, EXCERPT_CHARS),
            }
        })?;

        tracing::info!(title = %quiz.title, questions = quiz.questions.len(), "quiz generated");
        Ok(quiz)
    }
}
