//! User-uploaded quiz files.
//!
//! An upload must be a JSON object with a string `title` and an array
//! `questions`. That shape check runs before any per-question coercion;
//! anything failing it is rejected outright and the current quiz stays.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::error::{NormalizeError, QuizError};
use crate::model::{Quiz, QuestionKind};
use crate::normalize::{normalize_or_sample, normalize_quiz};

/// A normalized upload plus anything worth telling the author about.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub quiz: Quiz,
    /// Raw questions discarded during normalization.
    pub dropped: usize,
    pub warnings: Vec<UploadWarning>,
}

/// A non-fatal issue found in an uploaded quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadWarning {
    /// The question id (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

/// Parse and normalize an uploaded quiz document.
pub fn parse_upload(content: &str) -> Result<Quiz, QuizError> {
    inspect_upload(content).map(|report| report.quiz)
}

/// Read an uploaded quiz from disk.
pub fn load_upload(path: &Path) -> Result<UploadReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;
    inspect_upload(&content).with_context(|| format!("rejected quiz file: {}", path.display()))
}

/// Cold-start load of the default quiz.
///
/// Never fails: a missing, unreadable or unusable file yields the canonical
/// sample quiz instead.
pub fn load_default_quiz(path: &Path) -> Quiz {
    let value = match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "default quiz is not valid JSON: {e}");
            Value::Null
        }),
        Err(_) => {
            tracing::debug!(path = %path.display(), "no default quiz on disk");
            Value::Null
        }
    };
    normalize_or_sample(&value, None)
}

/// Parse, shape-check and normalize, collecting warnings.
pub fn inspect_upload(content: &str) -> Result<UploadReport, QuizError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| QuizError::Validation(format!("not valid JSON: {e}")))?;
    check_upload_shape(&value)?;

    let raw_count = value["questions"].as_array().map_or(0, Vec::len);
    let quiz = normalize_quiz(&value, None).map_err(|NormalizeError::EmptyQuiz| {
        QuizError::Validation("no usable questions in file".to_string())
    })?;

    let warnings = quiz
        .questions
        .iter()
        .filter_map(|q| {
            let ungradable = match &q.kind {
                QuestionKind::Text { keywords } => keywords.is_empty(),
                QuestionKind::Code {
                    expected_key_points,
                    ..
                } => expected_key_points.is_empty(),
                QuestionKind::Mcq { .. } => false,
            };
            ungradable.then(|| UploadWarning {
                question_id: Some(q.id.clone()),
                message: format!("{} question has nothing to grade against", q.question_type()),
            })
        })
        .collect();

    Ok(UploadReport {
        dropped: raw_count - quiz.questions.len(),
        quiz,
        warnings,
    })
}

/// Top-level shape check: `{ title: string, questions: array }`.
pub fn check_upload_shape(value: &Value) -> Result<(), QuizError> {
    let Some(obj) = value.as_object() else {
        return Err(QuizError::Validation("expected a JSON object".to_string()));
    };
    if !obj.get("title").is_some_and(Value::is_string) {
        return Err(QuizError::Validation("`title` must be a string".to_string()));
    }
    if !obj.get("questions").is_some_and(Value::is_array) {
        return Err(QuizError::Validation("`questions` must be an array".to_string()));
    }
    Ok(())
}
