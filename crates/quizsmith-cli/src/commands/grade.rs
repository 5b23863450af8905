//! The `quizsmith grade` command.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quizsmith_core::export::ResultExport;
use quizsmith_core::model::{Answer, AnswerValue, Quiz};
use quizsmith_core::proctor::ProctorSummary;
use quizsmith_core::scoring::{grade, Grade};
use quizsmith_core::upload::load_upload;

pub fn execute(
    quiz_path: PathBuf,
    answers_path: PathBuf,
    duration: Option<u64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let quiz = load_upload(&quiz_path)?.quiz;
    let answers = load_answers(&answers_path)?;

    let unknown: Vec<&String> = answers
        .keys()
        .filter(|id| quiz.question(id).is_none())
        .collect();
    if !unknown.is_empty() {
        eprintln!("Ignoring answers for unknown question(s): {unknown:?}");
    }

    let result = grade(&quiz, &answers);
    print_summary(&quiz, &result, duration);

    if let Some(path) = output {
        let export = ResultExport {
            quiz_title: quiz.title.clone(),
            answers: result.answers,
            score: result.score,
            proctor: ProctorSummary::default(),
        };
        export.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

/// Answers are read one entry at a time; an entry with no usable value
/// counts as unanswered instead of rejecting the file.
fn load_answers(path: &Path) -> Result<HashMap<String, AnswerValue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers: {}", path.display()))?;
    let raw: HashMap<String, serde_json::Value> =
        serde_json::from_str(&content).with_context(|| {
            format!(
                "answers must be a JSON object of question id to option index or text: {}",
                path.display()
            )
        })?;
    Ok(parse_answers(raw))
}

fn parse_answers(raw: HashMap<String, serde_json::Value>) -> HashMap<String, AnswerValue> {
    let mut answers = HashMap::with_capacity(raw.len());
    for (id, value) in raw {
        match AnswerValue::from_json(&value) {
            Some(answer) => {
                answers.insert(id, answer);
            }
            None if value.is_null() => {}
            None => eprintln!("Treating answer for {id:?} as unanswered: unsupported value {value}"),
        }
    }
    answers
}

pub(crate) fn print_summary(quiz: &Quiz, result: &Grade, duration: Option<u64>) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Type", "Answer", "Result", "Points"]);

    for (question, answer) in quiz.questions.iter().zip(&result.answers) {
        table.add_row(vec![
            Cell::new(&question.id),
            Cell::new(answer.question_type),
            Cell::new(answer_preview(answer)),
            Cell::new(verdict(answer)),
            Cell::new(format!("{}/{}", answer.points_awarded, question.points)),
        ]);
    }

    println!("{}\n{table}", quiz.title);
    println!(
        "Score: {}% ({}/{} points)",
        result.score, result.earned, result.total
    );
    if let Some(secs) = duration {
        println!("Duration: {}m {:02}s", secs / 60, secs % 60);
    }
    if !result.weak_areas.is_empty() {
        println!("Weak areas: {}", result.weak_areas.join(", "));
    }
}

fn verdict(answer: &Answer) -> &'static str {
    match answer.correct {
        Some(true) => "correct",
        Some(false) if answer.points_awarded > 0 => "partial",
        Some(false) => "wrong",
        None => "ungraded",
    }
}

fn answer_preview(answer: &Answer) -> String {
    const MAX: usize = 30;
    match &answer.value {
        None => "-".to_string(),
        Some(value) => {
            let text = value.as_text().replace('\n', " ");
            if text.chars().count() > MAX {
                let cut: String = text.chars().take(MAX).collect();
                format!("{cut}...")
            } else {
                text
            }
        }
    }
}
