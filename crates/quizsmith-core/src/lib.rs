//! quizsmith-core — Quiz model, normalization, scoring, sessions and proctoring.
//!
//! This crate turns untrusted quiz input (AI responses or uploaded files)
//! into validated quizzes, grades attempts against them, and runs the timed,
//! optionally proctored attempt lifecycle.

pub mod analytics;
pub mod error;
pub mod export;
pub mod extract;
pub mod generate;
pub mod model;
pub mod normalize;
pub mod proctor;
pub mod scoring;
pub mod session;
pub mod traits;
pub mod upload;

pub use error::{ErrorBody, ErrorCode, ProviderError, QuizError};
pub use model::{Answer, AnswerValue, Attempt, Question, QuestionKind, Quiz};
pub use session::{Session, SessionState};
