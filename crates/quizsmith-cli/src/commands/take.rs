//! The `quizsmith take` command.
//!
//! Reads answers line by line from stdin. Lines starting with `:` are
//! commands; the proctoring ones stand in for the environment signals a
//! browser surface would forward.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use quizsmith_core::analytics::AnalyticsSink;
use quizsmith_core::model::{AnswerValue, Attempt, Question, QuestionKind};
use quizsmith_core::proctor::{
    Disposition, ManualSignalSource, ProctorEventExport, ProctorSignal,
};
use quizsmith_core::session::Session;
use quizsmith_core::upload::{load_default_quiz, load_upload};
use quizsmith_providers::config::load_config_from;

use super::grade::print_summary;
use super::init::DEFAULT_QUIZ_FILE;

/// Analytics sink that reports through the log.
struct LogAnalytics;

#[async_trait]
impl AnalyticsSink for LogAnalytics {
    async fn record_attempt(&self, learner: &str, attempt: &Attempt) -> Result<()> {
        anyhow::ensure!(!learner.trim().is_empty(), "learner id is required");
        tracing::info!(
            learner,
            quiz = attempt.quiz_title(),
            score = attempt.score(),
            duration_sec = attempt.duration_sec(),
            "attempt recorded"
        );
        Ok(())
    }

    async fn record_proctor_event(&self, learner: &str, event: &ProctorEventExport) -> Result<()> {
        tracing::info!(learner, kind = %event.kind, detail = %event.detail, "proctor event");
        Ok(())
    }
}

enum Step {
    Answered(AnswerValue),
    Skip,
    Submit,
}

pub async fn execute(
    quiz_path: Option<PathBuf>,
    learner: String,
    proctor: bool,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let quiz = match &quiz_path {
        Some(path) => load_upload(path)?.quiz,
        None => load_default_quiz(Path::new(DEFAULT_QUIZ_FILE)),
    };

    let signals = Arc::new(ManualSignalSource::new());
    let mut session = Session::new(learner, quiz, signals.clone())
        .with_proctoring(proctor || config.session.proctoring);
    session.start()?;

    println!(
        "{} ({} questions). Commands: :skip :submit{}",
        session.quiz().title,
        session.quiz().questions.len(),
        if session.proctoring_enabled() {
            ". Proctoring is on."
        } else {
            ""
        }
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let questions = session.quiz().questions.clone();

    'questions: for (n, question) in questions.iter().enumerate() {
        print_question(n + 1, question);
        match read_answer(&mut lines, question, &signals, &session).await? {
            Step::Answered(value) => session.answer(&question.id, value)?,
            Step::Skip => continue,
            Step::Submit => break 'questions,
        }
    }

    session.submit(&LogAnalytics).await?;
    let outcome = session
        .outcome()
        .context("attempt was not graded")?;

    println!();
    print_summary(
        session.quiz(),
        &outcome.grade,
        Some(outcome.attempt.duration_sec()),
    );
    if session.proctoring_enabled() {
        println!("Proctoring warnings: {}", session.warnings());
    }

    if let Some(path) = output {
        let export = session
            .result_export()
            .context("attempt was not graded")?;
        export.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn print_question(n: usize, question: &Question) {
    println!(
        "\n{n}. [{} {}, {} pt] {}",
        question.question_type(),
        question.level,
        question.points,
        question.q
    );
    match &question.kind {
        QuestionKind::Mcq { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                println!("   {}) {option}", i + 1);
            }
        }
        QuestionKind::Code {
            starter_code: Some(code),
            ..
        } => {
            println!("{code}");
            println!("(end the answer with a line containing only `.`)");
        }
        QuestionKind::Code { .. } => {
            println!("(end the answer with a line containing only `.`)");
        }
        QuestionKind::Text { .. } => {}
    }
}

/// Read until the learner answers, skips or submits. EOF submits.
async fn read_answer(
    lines: &mut Lines<BufReader<Stdin>>,
    question: &Question,
    signals: &ManualSignalSource,
    session: &Session,
) -> Result<Step> {
    let mut code = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();

        if let Some(command) = trimmed.strip_prefix(':') {
            match command {
                "skip" => return Ok(Step::Skip),
                "submit" => return Ok(Step::Submit),
                other => match parse_signal(other) {
                    Some(kind) => {
                        let disposition = signals.fire(kind, "cli");
                        if session.proctoring_active() {
                            let blocked = if disposition == Disposition::Suppress {
                                " (blocked)"
                            } else {
                                ""
                            };
                            println!("Warning: {kind}{blocked}");
                        }
                    }
                    None => println!("Unknown command: {other}"),
                },
            }
            continue;
        }

        match &question.kind {
            QuestionKind::Mcq { .. } => match parse_choice(trimmed) {
                Some(index) => return Ok(Step::Answered(AnswerValue::Choice(index))),
                None => println!("Enter an option number from 1 to 4."),
            },
            QuestionKind::Text { .. } => {
                return Ok(Step::Answered(AnswerValue::Text(line)));
            }
            QuestionKind::Code { .. } => {
                if trimmed == "." {
                    return Ok(Step::Answered(AnswerValue::Text(code.join("\n"))));
                }
                code.push(line);
            }
        }
    }

    if !code.is_empty() {
        return Ok(Step::Answered(AnswerValue::Text(code.join("\n"))));
    }
    Ok(Step::Submit)
}

/// Option number (1-4) or letter (a-d) to a zero-based index.
fn parse_choice(input: &str) -> Option<i64> {
    let input = input.trim().to_ascii_lowercase();
    if let Ok(n) = input.parse::<i64>() {
        return (1..=4).contains(&n).then_some(n - 1);
    }
    match input.as_str() {
        "a" => Some(0),
        "b" => Some(1),
        "c" => Some(2),
        "d" => Some(3),
        _ => None,
    }
}

fn parse_signal(command: &str) -> Option<ProctorSignal> {
    match command {
        "hide" => Some(ProctorSignal::TabHidden),
        "blur" => Some(ProctorSignal::WindowBlur),
        "copy" => Some(ProctorSignal::CopyAttempt),
        "paste" => Some(ProctorSignal::PasteAttempt),
        "menu" => Some(ProctorSignal::ContextMenu),
        _ => None,
    }
}
