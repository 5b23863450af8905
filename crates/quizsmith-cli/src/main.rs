//! quizsmith CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use quizsmith_core::generate::{DifficultyMix, QuestionTypeMix};

mod commands;

#[derive(Parser)]
#[command(name = "quizsmith", version, about = "AI-generated quizzes, grading and proctored attempts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a quiz with the configured AI provider
    Generate {
        /// What the quiz is about
        #[arg(long, default_value = "")]
        topic: String,

        /// Question types: mixed, mcq, text, code
        #[arg(long = "type", default_value = "mixed")]
        question_type: QuestionTypeMix,

        /// Difficulty: mixed, easy, medium, hard
        #[arg(long, default_value = "mixed")]
        difficulty: DifficultyMix,

        /// Number of questions (clamped to 1..=15)
        #[arg(long, default_value = "5")]
        count: u32,

        /// Source file the questions should be about
        #[arg(long)]
        context_file: Option<PathBuf>,

        /// Output language (defaults to the configured one)
        #[arg(long)]
        language: Option<String>,

        /// Write the quiz JSON here instead of stdout (same document either way)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a quiz JSON file
    Validate {
        /// Path to the quiz file
        #[arg(long)]
        file: PathBuf,
    },

    /// Grade an answers file against a quiz
    Grade {
        /// Path to the quiz file
        #[arg(long)]
        quiz: PathBuf,

        /// JSON object mapping question id to an option index or text
        #[arg(long)]
        answers: PathBuf,

        /// Attempt duration in seconds, for the summary
        #[arg(long)]
        duration: Option<u64>,

        /// Write the result export here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Take a quiz interactively
    Take {
        /// Path to the quiz file (defaults to sample-quiz.json, or the built-in sample)
        #[arg(long)]
        quiz: Option<PathBuf>,

        /// Learner id recorded with the attempt
        #[arg(long, default_value = "local")]
        learner: String,

        /// Enable proctoring for this attempt
        #[arg(long)]
        proctor: bool,

        /// Write the result export here
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and a sample quiz
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizsmith=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            topic,
            question_type,
            difficulty,
            count,
            context_file,
            language,
            output,
            config,
        } => {
            commands::generate::execute(commands::generate::GenerateArgs {
                topic,
                question_type,
                difficulty,
                count,
                context_file,
                language,
                output,
                config,
            })
            .await
        }
        Commands::Validate { file } => commands::validate::execute(file),
        Commands::Grade {
            quiz,
            answers,
            duration,
            output,
        } => commands::grade::execute(quiz, answers, duration, output),
        Commands::Take {
            quiz,
            learner,
            proctor,
            output,
            config,
        } => commands::take::execute(quiz, learner, proctor, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
