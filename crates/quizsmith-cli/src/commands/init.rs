//! The `quizsmith init` command.

use anyhow::Result;

use quizsmith_core::model::Quiz;

/// Quiz file written by `init` and taken when `take` gets no `--quiz`.
pub const DEFAULT_QUIZ_FILE: &str = "sample-quiz.json";

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizsmith.toml").exists() {
        println!("quizsmith.toml already exists, skipping.");
    } else {
        std::fs::write("quizsmith.toml", SAMPLE_CONFIG)?;
        println!("Created quizsmith.toml");
    }

    let sample_path = std::path::Path::new(DEFAULT_QUIZ_FILE);
    if sample_path.exists() {
        println!("{DEFAULT_QUIZ_FILE} already exists, skipping.");
    } else {
        std::fs::write(sample_path, serde_json::to_string_pretty(&Quiz::sample())?)?;
        println!("Created {DEFAULT_QUIZ_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Set QUIZSMITH_API_KEY or edit quizsmith.toml");
    println!("  2. Run: quizsmith take");
    println!("  3. Run: quizsmith generate --topic \"Rust ownership\" --output quiz.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizsmith configuration

[provider]
api_key = "${OPENAI_API_KEY}"
base_url = "https://api.openai.com"
model = "gpt-4.1-mini"

[generation]
max_tokens = 4096
temperature = 0.7
# Hard budget for one AI call; slower calls fail with UPSTREAM_TIMEOUT.
timeout_ms = 45000
output_language = "English"

[session]
proctoring = false
"#;
