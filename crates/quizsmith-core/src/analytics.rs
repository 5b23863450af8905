//! The analytics collaborator boundary.
//!
//! Graded attempts and the most recent proctoring events are handed to an
//! [`AnalyticsSink`]. Recording is all-or-nothing from the caller's point of
//! view; a failed call means nothing was stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;

use crate::model::Attempt;
use crate::proctor::{ProctorEvent, ProctorEventExport};

/// How many of the latest proctoring events are exported after grading.
pub const EXPORTED_EVENT_LIMIT: usize = 10;

/// Receives graded attempts and proctoring events.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Persist one attempt for a learner.
    async fn record_attempt(&self, learner: &str, attempt: &Attempt) -> Result<()>;

    /// Persist one proctoring event for a learner.
    async fn record_proctor_event(&self, learner: &str, event: &ProctorEventExport) -> Result<()>;
}

/// Send the most recent [`EXPORTED_EVENT_LIMIT`] events, one call each.
///
/// Returns how many were accepted. Failures are logged, not propagated.
pub async fn export_proctor_events(
    sink: &dyn AnalyticsSink,
    learner: &str,
    events: &[ProctorEvent],
) -> usize {
    let skip = events.len().saturating_sub(EXPORTED_EVENT_LIMIT);
    let exports: Vec<ProctorEventExport> = events[skip..].iter().map(Into::into).collect();

    let results = join_all(
        exports
            .iter()
            .map(|event| sink.record_proctor_event(learner, event)),
    )
    .await;

    let mut delivered = 0;
    for result in results {
        match result {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(learner, "failed to export proctor event: {e:#}"),
        }
    }
    delivered
}

/// Everything stored for one learner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearnerRecord {
    pub attempts: Vec<Attempt>,
    pub proctor_events: Vec<ProctorEventExport>,
}

/// In-memory analytics store.
///
/// Each learner's record has a single writer at a time: updates take the
/// learner's lock, modify a copy, and swap it in only on success.
#[derive(Default)]
pub struct MemoryAnalytics {
    learners: Mutex<HashMap<String, Arc<tokio::sync::Mutex<LearnerRecord>>>>,
}

impl MemoryAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, learner: &str) -> LearnerRecord {
        self.slot(learner).lock().await.clone()
    }

    pub async fn attempts(&self, learner: &str) -> Vec<Attempt> {
        self.slot(learner).lock().await.attempts.clone()
    }

    pub async fn proctor_events(&self, learner: &str) -> Vec<ProctorEventExport> {
        self.slot(learner).lock().await.proctor_events.clone()
    }

    fn slot(&self, learner: &str) -> Arc<tokio::sync::Mutex<LearnerRecord>> {
        let mut learners = self
            .learners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(learners.entry(learner.to_string()).or_default())
    }

    async fn update<F>(&self, learner: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut LearnerRecord) -> Result<()> + Send,
    {
        let slot = self.slot(learner);
        let mut current = slot.lock().await;
        let mut next = current.clone();
        apply(&mut next)?;
        *current = next;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for MemoryAnalytics {
    async fn record_attempt(&self, learner: &str, attempt: &Attempt) -> Result<()> {
        anyhow::ensure!(!learner.trim().is_empty(), "learner id is required");
        let attempt = attempt.clone();
        self.update(learner, move |record| {
            record.attempts.push(attempt);
            Ok(())
        })
        .await
    }

    async fn record_proctor_event(&self, learner: &str, event: &ProctorEventExport) -> Result<()> {
        anyhow::ensure!(!learner.trim().is_empty(), "learner id is required");
        let event = event.clone();
        self.update(learner, move |record| {
            record.proctor_events.push(event);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proctor::{ProctorSignal, ProctorSummary};
    use chrono::Utc;

    fn attempt(score: u32) -> Attempt {
        Attempt::new(
            "Rust".into(),
            score,
            3,
            42,
            vec!["mcq-easy".into()],
            ProctorSummary::default(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_are_not_lost() {
        let store = Arc::new(MemoryAnalytics::new());
        let mut handles = Vec::new();
        for score in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record_attempt("ada", &attempt(score)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.attempts("ada").await.len(), 20);
        assert!(store.attempts("grace").await.is_empty());
    }

    #[tokio::test]
    async fn rejected_record_leaves_store_unchanged() {
        let store = MemoryAnalytics::new();
        assert!(store.record_attempt(" ", &attempt(10)).await.is_err());
        assert!(store.attempts(" ").await.is_empty());
    }

    #[tokio::test]
    async fn exports_only_most_recent_events() {
        let store = MemoryAnalytics::new();
        let events: Vec<ProctorEvent> = (0..14)
            .map(|n| ProctorEvent {
                kind: ProctorSignal::TabHidden,
                detail: format!("hidden {n}"),
                at: Utc::now(),
            })
            .collect();

        let delivered = export_proctor_events(&store, "ada", &events).await;
        assert_eq!(delivered, 10);

        let stored = store.proctor_events("ada").await;
        assert_eq!(stored.len(), 10);
        assert!(stored.iter().all(|e| e.detail != "hidden 3"));
        assert!(stored.iter().any(|e| e.detail == "hidden 13"));
    }
}
