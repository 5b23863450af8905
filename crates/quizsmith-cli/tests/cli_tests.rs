//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizsmith() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizsmith").unwrap();
    cmd.env_remove("QUIZSMITH_API_KEY")
        .env_remove("QUIZSMITH_MODEL")
        .env_remove("QUIZSMITH_BASE_URL");
    cmd
}

const QUIZ: &str = r#"{
    "title": "Rust Basics",
    "description": "Ownership and bindings",
    "questions": [
        {"id": "q1", "type": "mcq", "q": "Which keyword declares a binding?", "level": "easy",
         "options": ["let", "var", "def", "dim"], "correctIndex": 0},
        {"id": "q2", "type": "text", "q": "What happens on move?", "level": "medium", "points": 2,
         "keywords": ["ownership", "invalid"]},
        {"id": "q3", "type": "code", "q": "Write add", "level": "hard", "points": 3,
         "expectedKeyPoints": ["fn add", "a + b", "i32"]}
    ]
}"#;

fn write_quiz(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("quiz.json");
    std::fs::write(&path, QUIZ).unwrap();
    path
}

#[test]
fn validate_valid_quiz() {
    let dir = TempDir::new().unwrap();
    let quiz = write_quiz(&dir);

    quizsmith()
        .arg("validate")
        .arg("--file")
        .arg(&quiz)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust Basics (3 questions, 6 points)"))
        .stdout(predicate::str::contains("Quiz is valid"));
}

#[test]
fn validate_warns_about_ungradable_questions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quiz.json");
    std::fs::write(
        &path,
        r#"{"title": "T", "questions": [{"type": "text", "q": "Explain"}, {"q": ""}]}"#,
    )
    .unwrap();

    quizsmith()
        .arg("validate")
        .arg("--file")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 question(s) dropped"))
        .stdout(predicate::str::contains("[q1] WARNING: text question has nothing to grade against"));
}

#[test]
fn validate_rejects_bad_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quiz.json");
    std::fs::write(&path, r#"{"questions": []}"#).unwrap();

    quizsmith()
        .arg("validate")
        .arg("--file")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("`title` must be a string"));
}

#[test]
fn validate_nonexistent_file() {
    quizsmith()
        .arg("validate")
        .arg("--file")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_writes_result_export() {
    let dir = TempDir::new().unwrap();
    let quiz = write_quiz(&dir);
    let answers = dir.path().join("answers.json");
    std::fs::write(
        &answers,
        r#"{"q1": 0, "q2": "Ownership moves and the old binding is invalid", "q3": "fn add(a: i32, b: i32) -> i32 { a + b }"}"#,
    )
    .unwrap();
    let output = dir.path().join("out/result.json");

    quizsmith()
        .arg("grade")
        .arg("--quiz")
        .arg(&quiz)
        .arg("--answers")
        .arg(&answers)
        .arg("--duration")
        .arg("75")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 100% (6/6 points)"))
        .stdout(predicate::str::contains("Duration: 1m 15s"));

    let export: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(export["quizTitle"], "Rust Basics");
    assert_eq!(export["score"], 100);
    assert_eq!(export["answers"].as_array().unwrap().len(), 3);
    assert_eq!(export["proctor"]["enabled"], false);
}

#[test]
fn grade_reports_weak_areas() {
    let dir = TempDir::new().unwrap();
    let quiz = write_quiz(&dir);
    let answers = dir.path().join("answers.json");
    std::fs::write(&answers, r#"{"q1": 2}"#).unwrap();

    quizsmith()
        .arg("grade")
        .arg("--quiz")
        .arg(&quiz)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0%"))
        .stdout(predicate::str::contains(
            "Weak areas: mcq-easy, text-medium, code-hard",
        ));
}

#[test]
fn grade_rejects_non_object_answers() {
    let dir = TempDir::new().unwrap();
    let quiz = write_quiz(&dir);
    let answers = dir.path().join("answers.json");
    std::fs::write(&answers, "[1, 2]").unwrap();

    quizsmith()
        .arg("grade")
        .arg("--quiz")
        .arg(&quiz)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("answers must be a JSON object"));
}

#[test]
fn grade_accepts_float_and_null_answers() {
    let dir = TempDir::new().unwrap();
    let quiz = write_quiz(&dir);
    let answers = dir.path().join("answers.json");
    std::fs::write(&answers, r#"{"q1": 0.0, "q2": null, "q3": false}"#).unwrap();

    quizsmith()
        .arg("grade")
        .arg("--quiz")
        .arg(&quiz)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 17% (1/6 points)"))
        .stderr(predicate::str::contains("\"q3\" as unanswered"));
}

#[test]
fn take_quiz_over_stdin() {
    let dir = TempDir::new().unwrap();
    let quiz = write_quiz(&dir);
    let output = dir.path().join("result.json");

    quizsmith()
        .current_dir(dir.path())
        .arg("take")
        .arg("--quiz")
        .arg(&quiz)
        .arg("--proctor")
        .arg("--output")
        .arg(&output)
        .write_stdin(":blur\na\n:paste\nownership is moved\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n.\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Proctoring is on"))
        .stdout(predicate::str::contains("Warning: paste_attempt (blocked)"))
        .stdout(predicate::str::contains("Score: 83%"))
        .stdout(predicate::str::contains("Proctoring warnings: 2"));

    let export: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(export["proctor"]["enabled"], true);
    assert_eq!(export["proctor"]["warnings"], 2);
    assert_eq!(export["proctor"]["events"][0]["type"], "window_blur");
}

#[test]
fn take_submits_early_and_ignores_signals_without_proctoring() {
    let dir = TempDir::new().unwrap();
    let quiz = write_quiz(&dir);

    quizsmith()
        .current_dir(dir.path())
        .arg("take")
        .arg("--quiz")
        .arg(&quiz)
        .write_stdin(":copy\n1\n:submit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 17%"))
        .stdout(predicate::str::contains("Warning:").not())
        .stdout(predicate::str::contains("Proctoring warnings").not());
}

#[test]
fn take_without_quiz_uses_sample() {
    let dir = TempDir::new().unwrap();

    quizsmith()
        .current_dir(dir.path())
        .arg("take")
        .write_stdin("1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Quiz (1 questions)"))
        .stdout(predicate::str::contains("Score: 100%"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizsmith()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizsmith.toml"))
        .stdout(predicate::str::contains("Created sample-quiz.json"));

    assert!(dir.path().join("quizsmith.toml").exists());

    quizsmith()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--file")
        .arg("sample-quiz.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Quiz (1 questions, 1 points)"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizsmith()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    quizsmith()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn generate_requires_topic_or_context() {
    let dir = TempDir::new().unwrap();

    quizsmith()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BAD_REQUEST"));
}

#[test]
fn help_output() {
    quizsmith()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "AI-generated quizzes, grading and proctored attempts",
        ));
}

#[test]
fn version_output() {
    quizsmith()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizsmith"));
}
