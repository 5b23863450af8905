//! Quiz attempt lifecycle.
//!
//! A session moves through a closed set of states:
//!
//! ```text
//! authoring --start--> taking --submit--> graded
//!     ^                 |  ^                 |
//!     |                 +--+ start (restart) |
//!     +------------- load_quiz --------------+
//!                        graded --start--> taking (fresh attempt)
//! ```
//!
//! Entering `taking` always resets the timer, answers and proctoring log.
//! The timer is a background tick task that only runs while `taking`;
//! proctoring observers are attached only while `taking` with proctoring
//! enabled. Both are released on every exit path, including drop.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::analytics::{export_proctor_events, AnalyticsSink};
use crate::export::ResultExport;
use crate::model::{AnswerValue, Attempt, Quiz};
use crate::proctor::{ProctorCollector, ProctorEvent, SignalSource};
use crate::scoring::{self, Grade};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Authoring,
    Taking,
    Graded,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Authoring => write!(f, "authoring"),
            SessionState::Taking => write!(f, "taking"),
            SessionState::Graded => write!(f, "graded"),
        }
    }
}

/// Inputs that drive state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    LoadQuiz,
    Start,
    Submit,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAction::LoadQuiz => write!(f, "load quiz"),
            SessionAction::Start => write!(f, "start"),
            SessionAction::Submit => write!(f, "submit"),
        }
    }
}

impl SessionState {
    /// The state reached by applying `action`, or an error if illegal.
    pub fn transition(self, action: SessionAction) -> Result<SessionState, SessionError> {
        use SessionAction::*;
        use SessionState::*;

        match (self, action) {
            (Authoring | Graded, LoadQuiz) => Ok(Authoring),
            (_, Start) => Ok(Taking),
            (Taking, Submit) => Ok(Graded),
            (from, action) => Err(SessionError::IllegalTransition { from, action }),
        }
    }
}

/// Errors from driving a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {from}")]
    IllegalTransition {
        from: SessionState,
        action: SessionAction,
    },

    #[error("answers can only change while taking (currently {0})")]
    NotTaking(SessionState),

    #[error("unknown question id: {0}")]
    UnknownQuestion(String),

    #[error("the attempt timer needs a Tokio runtime")]
    NoRuntime,
}

/// Result of the grading transition.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedOutcome {
    pub grade: Grade,
    pub attempt: Attempt,
    /// Whether the analytics collaborator accepted the attempt.
    pub persisted: bool,
    /// How many proctoring events the collaborator accepted.
    pub exported_events: usize,
}

/// Counts whole seconds while an attempt is running.
struct AttemptTimer {
    elapsed: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

impl AttemptTimer {
    fn new() -> Self {
        Self {
            elapsed: Arc::new(AtomicU64::new(0)),
            ticker: None,
        }
    }

    /// Reset to zero and start ticking.
    fn restart(&mut self) -> Result<(), SessionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        self.stop();
        self.elapsed.store(0, Ordering::Relaxed);

        let elapsed = Arc::clone(&self.elapsed);
        self.ticker = Some(runtime.spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                elapsed.fetch_add(1, Ordering::Relaxed);
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }
}

impl Drop for AttemptTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One learner working through one quiz.
pub struct Session {
    id: Uuid,
    learner: String,
    quiz: Quiz,
    state: SessionState,
    proctoring: bool,
    timer: AttemptTimer,
    collector: ProctorCollector,
    answers: HashMap<String, AnswerValue>,
    outcome: Option<GradedOutcome>,
}

impl Session {
    /// Create a session in `authoring` with proctoring disabled.
    pub fn new(learner: impl Into<String>, quiz: Quiz, signals: Arc<dyn SignalSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            learner: learner.into(),
            quiz,
            state: SessionState::Authoring,
            proctoring: false,
            timer: AttemptTimer::new(),
            collector: ProctorCollector::new(signals),
            answers: HashMap::new(),
            outcome: None,
        }
    }

    pub fn with_proctoring(mut self, enabled: bool) -> Self {
        self.set_proctoring(enabled);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn learner(&self) -> &str {
        &self.learner
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whole seconds spent in the current (or last) attempt.
    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn proctoring_enabled(&self) -> bool {
        self.proctoring
    }

    pub fn proctoring_active(&self) -> bool {
        self.collector.is_active()
    }

    /// Warnings for the current attempt; once graded, those recorded with it.
    pub fn warnings(&self) -> u32 {
        match &self.outcome {
            Some(outcome) => outcome.attempt.proctor_summary().warnings,
            None => self.collector.warnings(),
        }
    }

    pub fn proctor_events(&self) -> Vec<ProctorEvent> {
        match &self.outcome {
            Some(outcome) => outcome.attempt.proctor_summary().events.clone(),
            None => self.collector.events(),
        }
    }

    pub fn answers(&self) -> &HashMap<String, AnswerValue> {
        &self.answers
    }

    /// The grading result, once `graded`.
    pub fn outcome(&self) -> Option<&GradedOutcome> {
        self.outcome.as_ref()
    }

    /// Replace the quiz. From `graded` this returns the session to `authoring`.
    pub fn load_quiz(&mut self, quiz: Quiz) -> Result<(), SessionError> {
        let next = self.apply(SessionAction::LoadQuiz)?;
        self.quiz = quiz;
        self.answers.clear();
        self.outcome = None;
        self.state = next;
        tracing::info!(session = %self.id, title = %self.quiz.title, "quiz loaded");
        Ok(())
    }

    /// Begin a fresh attempt. Never resumes a previous one.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let next = self.apply(SessionAction::Start)?;
        self.timer.restart()?;
        self.collector.deactivate();
        self.collector.reset();
        self.answers.clear();
        self.outcome = None;
        self.state = next;
        self.sync_collector();
        tracing::info!(
            session = %self.id,
            learner = %self.learner,
            questions = self.quiz.questions.len(),
            proctoring = self.proctoring,
            "attempt started"
        );
        Ok(())
    }

    /// Record or overwrite the answer to one question.
    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> Result<(), SessionError> {
        if self.state != SessionState::Taking {
            return Err(SessionError::NotTaking(self.state));
        }
        if self.quiz.question(question_id).is_none() {
            return Err(SessionError::UnknownQuestion(question_id.to_string()));
        }
        self.answers.insert(question_id.to_string(), value);
        Ok(())
    }

    /// Toggle proctoring. Already collected events and warnings are kept.
    pub fn set_proctoring(&mut self, enabled: bool) {
        self.proctoring = enabled;
        self.sync_collector();
    }

    /// Grade the attempt, persist it, then stop proctoring.
    ///
    /// A failing analytics sink never blocks the learner's score; it is
    /// reported through [`GradedOutcome::persisted`].
    pub async fn submit(
        &mut self,
        analytics: &dyn AnalyticsSink,
    ) -> Result<&GradedOutcome, SessionError> {
        let next = self.apply(SessionAction::Submit)?;
        self.timer.stop();

        let grade = scoring::grade(&self.quiz, &self.answers);
        let attempt = Attempt::new(
            self.quiz.title.clone(),
            grade.score,
            self.quiz.questions.len(),
            self.timer.elapsed_secs(),
            grade.weak_areas.clone(),
            self.collector.summary(self.proctoring),
        );

        let persisted = match analytics.record_attempt(&self.learner, &attempt).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(session = %self.id, "failed to record attempt: {e:#}");
                false
            }
        };

        self.collector.deactivate();
        self.state = next;

        // The recorded summary is authoritative from here on; anything the
        // collector caught while the attempt was being saved is not part of it.
        let exported_events = export_proctor_events(
            analytics,
            &self.learner,
            &attempt.proctor_summary().events,
        )
        .await;

        tracing::info!(
            session = %self.id,
            score = grade.score,
            duration_sec = attempt.duration_sec(),
            warnings = attempt.proctor_summary().warnings,
            persisted,
            "attempt graded"
        );

        Ok(self.outcome.insert(GradedOutcome {
            grade,
            attempt,
            persisted,
            exported_events,
        }))
    }

    /// The downloadable result document, once graded.
    pub fn result_export(&self) -> Option<ResultExport> {
        let outcome = self.outcome.as_ref()?;
        Some(ResultExport {
            quiz_title: self.quiz.title.clone(),
            answers: outcome.grade.answers.clone(),
            score: outcome.grade.score,
            proctor: outcome.attempt.proctor_summary().clone(),
        })
    }

    fn apply(&self, action: SessionAction) -> Result<SessionState, SessionError> {
        self.state.transition(action).inspect_err(|e| {
            tracing::warn!(session = %self.id, "rejected transition: {e}");
        })
    }

    fn sync_collector(&mut self) {
        if self.proctoring && self.state == SessionState::Taking {
            self.collector.activate();
        } else {
            self.collector.deactivate();
        }
    }
}
