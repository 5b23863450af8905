//! The `quizsmith generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizsmith_core::generate::{DifficultyMix, GenerationRequest, QuestionTypeMix, QuizGenerator};
use quizsmith_core::model::Quiz;
use quizsmith_providers::config::load_config_from;
use quizsmith_providers::create_provider;

pub struct GenerateArgs {
    pub topic: String,
    pub question_type: QuestionTypeMix,
    pub difficulty: DifficultyMix,
    pub count: u32,
    pub context_file: Option<PathBuf>,
    pub language: Option<String>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let context_code = match &args.context_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read context file: {}", path.display()))?,
        ),
        None => None,
    };

    let request = GenerationRequest {
        topic: args.topic,
        question_type: args.question_type,
        difficulty: args.difficulty,
        count: args.count,
        context_code,
        output_language: args
            .language
            .unwrap_or_else(|| config.generation.output_language.clone()),
    };

    let provider = create_provider(&config)?;
    let generator = QuizGenerator::new(provider, config.generation.completion_options());

    eprintln!(
        "Generating {} question(s) with {} ...",
        request.effective_count(),
        config.provider.model
    );

    let quiz = match generator.generate(&request).await {
        Ok(quiz) => quiz,
        Err(e) => {
            let body = e.to_body();
            eprintln!("{}", serde_json::to_string_pretty(&body)?);
            anyhow::bail!("{} ({})", e, body.code);
        }
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, render_quiz(&quiz)?)
                .with_context(|| format!("failed to write quiz to {}", path.display()))?;
            eprintln!(
                "Saved \"{}\" ({} questions, {} points) to {}",
                quiz.title,
                quiz.questions.len(),
                quiz.total_points(),
                path.display()
            );
        }
        None => println!("{}", render_quiz(&quiz)?),
    }

    Ok(())
}

/// The quiz document as written to stdout or `--output`.
///
/// Both destinations get the bare quiz so the result can go straight to
/// `validate` or `take`.
fn render_quiz(quiz: &Quiz) -> Result<String> {
    Ok(serde_json::to_string_pretty(quiz)?)
}
