//! Coercion of untrusted JSON into the canonical quiz schema.
//!
//! Works on any `serde_json::Value`, never fails on shape, and only reports
//! [`NormalizeError::EmptyQuiz`] when no usable question survives. The
//! output is a fixed point: normalizing a normalized quiz changes nothing.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::model::{
    Level, Question, QuestionKind, QuestionType, Quiz, MAX_POINTS, MCQ_OPTION_COUNT, MIN_POINTS,
};

const DEFAULT_TITLE: &str = "Untitled Quiz";

/// Normalize an arbitrary value into a [`Quiz`].
///
/// `max_count` truncates the raw question list before any per-question
/// coercion happens.
pub fn normalize_quiz(value: &Value, max_count: Option<usize>) -> Result<Quiz, NormalizeError> {
    let empty = Map::new();
    let (root, raw_questions): (&Map<String, Value>, &[Value]) = match value {
        Value::Object(map) => (
            map,
            map.get("questions")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        ),
        // A bare array is read as the question list.
        Value::Array(items) => (&empty, items.as_slice()),
        _ => (&empty, &[]),
    };

    let limit = max_count.unwrap_or(usize::MAX);
    let mut seen_ids = HashSet::new();
    let questions: Vec<Question> = raw_questions
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(index, raw)| normalize_question(raw, index))
        .map(|mut question| {
            question.id = unique_id(&question.id, &mut seen_ids);
            question
        })
        .collect();

    if questions.is_empty() {
        return Err(NormalizeError::EmptyQuiz);
    }

    Ok(Quiz {
        title: root
            .get("title")
            .and_then(castable_string)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: root
            .get("description")
            .and_then(castable_string)
            .unwrap_or_default(),
        questions,
    })
}

/// Normalize, substituting the canonical sample quiz when nothing is usable.
pub fn normalize_or_sample(value: &Value, max_count: Option<usize>) -> Quiz {
    normalize_quiz(value, max_count).unwrap_or_else(|_| {
        tracing::info!("no usable questions, falling back to the sample quiz");
        Quiz::sample()
    })
}

fn normalize_question(raw: &Value, index: usize) -> Option<Question> {
    let obj = raw.as_object()?;
    let q = first_castable(obj, &["q", "question", "prompt"])?;

    let level = first_castable(obj, &["level", "difficulty"])
        .map(|s| Level::parse_lenient(&s))
        .unwrap_or_default();

    let points = obj
        .get("points")
        .and_then(as_number)
        .map(|p| (p.round().clamp(MIN_POINTS as f64, MAX_POINTS as f64)) as u32)
        .unwrap_or_else(|| level.default_points());

    let id = obj
        .get("id")
        .and_then(castable_string)
        .unwrap_or_else(|| format!("q{}", index + 1));

    let question_type = obj
        .get("type")
        .and_then(Value::as_str)
        .map(QuestionType::parse_lenient)
        .unwrap_or(QuestionType::Text);

    let kind = match question_type {
        QuestionType::Mcq => {
            let supplied = string_list(obj.get("options"));
            let correct_index = correct_index(obj, &supplied);
            QuestionKind::Mcq {
                options: pad_options(supplied),
                correct_index,
            }
        }
        QuestionType::Text => QuestionKind::Text {
            keywords: string_list(obj.get("keywords")),
        },
        QuestionType::Code => QuestionKind::Code {
            starter_code: obj.get("starterCode").and_then(castable_string),
            expected_key_points: string_list(obj.get("expectedKeyPoints")),
        },
    };

    Some(Question {
        id,
        q,
        level,
        points,
        kind,
    })
}

fn pad_options(mut supplied: Vec<String>) -> [String; MCQ_OPTION_COUNT] {
    supplied.truncate(MCQ_OPTION_COUNT);
    let mut options: [String; MCQ_OPTION_COUNT] = Default::default();
    for (slot, option) in options.iter_mut().enumerate() {
        *option = supplied
            .get(slot)
            .cloned()
            .unwrap_or_else(|| format!("Option {}", option_letter(slot)));
    }
    options
}

fn option_letter(slot: usize) -> char {
    (b'A' + slot as u8) as char
}

/// `correctIndex` when numeric; otherwise an `answer` naming an option by
/// letter or by text. Clamped into range, defaulting to 0.
fn correct_index(obj: &Map<String, Value>, options: &[String]) -> usize {
    let max = (MCQ_OPTION_COUNT - 1) as f64;
    if let Some(index) = obj.get("correctIndex").and_then(as_number) {
        return index.trunc().clamp(0.0, max) as usize;
    }

    let Some(answer) = obj.get("answer").and_then(castable_string) else {
        return 0;
    };
    if let Some(pos) = options
        .iter()
        .take(MCQ_OPTION_COUNT)
        .position(|o| o.eq_ignore_ascii_case(&answer))
    {
        return pos;
    }
    let mut chars = answer.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            let slot = (c.to_ascii_uppercase() as u8).saturating_sub(b'A') as usize;
            slot.min(MCQ_OPTION_COUNT - 1)
        }
        _ => 0,
    }
}

fn unique_id(id: &str, seen: &mut HashSet<String>) -> String {
    if seen.insert(id.to_string()) {
        return id.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{id}-{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn first_castable(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(castable_string))
}

/// Strings, non-zero numbers and `true` cast to a trimmed non-empty string.
fn castable_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(castable_string).collect())
        .unwrap_or_default()
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
