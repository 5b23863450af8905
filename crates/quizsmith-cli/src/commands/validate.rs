//! The `quizsmith validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizsmith_core::upload::load_upload;

pub fn execute(path: PathBuf) -> Result<()> {
    let report = load_upload(&path)?;
    let quiz = &report.quiz;

    println!(
        "Quiz: {} ({} questions, {} points)",
        quiz.title,
        quiz.questions.len(),
        quiz.total_points()
    );
    if report.dropped > 0 {
        println!("  {} question(s) dropped during normalization", report.dropped);
    }

    for w in &report.warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if report.warnings.is_empty() {
        println!("Quiz is valid.");
    } else {
        println!("\n{} warning(s) found.", report.warnings.len());
    }

    Ok(())
}
