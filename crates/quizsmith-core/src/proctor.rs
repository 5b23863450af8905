//! Best-effort proctoring signal collection.
//!
//! Environment observers (focus, visibility, clipboard, context menu) are
//! abstracted behind [`SignalSource`]. While a collector is active it holds
//! an [`ObserverGuard`]; dropping the guard detaches the observer and turns
//! its [`SignalSink`] into a no-op, so no observer outlives the attempt that
//! attached it.
//!
//! The log keeps the most recent [`ProctorLog::CAPACITY`] events. The
//! `warnings` counter is independent of truncation and counts every capture.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Environment signals treated as integrity warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProctorSignal {
    TabHidden,
    WindowBlur,
    CopyAttempt,
    PasteAttempt,
    ContextMenu,
}

impl ProctorSignal {
    /// Whether the underlying action is blocked when captured.
    pub fn suppresses_default(self) -> bool {
        matches!(
            self,
            ProctorSignal::CopyAttempt | ProctorSignal::PasteAttempt | ProctorSignal::ContextMenu
        )
    }
}

impl fmt::Display for ProctorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProctorSignal::TabHidden => "tab_hidden",
            ProctorSignal::WindowBlur => "window_blur",
            ProctorSignal::CopyAttempt => "copy_attempt",
            ProctorSignal::PasteAttempt => "paste_attempt",
            ProctorSignal::ContextMenu => "context_menu",
        };
        f.write_str(s)
    }
}

/// One captured signal, stamped with the observer's wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProctorEvent {
    #[serde(rename = "type")]
    pub kind: ProctorSignal,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// The `{ type, detail }` shape sent to the analytics collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProctorEventExport {
    #[serde(rename = "type")]
    pub kind: ProctorSignal,
    pub detail: String,
}

impl From<&ProctorEvent> for ProctorEventExport {
    fn from(event: &ProctorEvent) -> Self {
        Self {
            kind: event.kind,
            detail: event.detail.clone(),
        }
    }
}

/// Proctoring state attached to an attempt or a result export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProctorSummary {
    pub enabled: bool,
    pub warnings: u32,
    pub events: Vec<ProctorEvent>,
}

/// Bounded event log plus uncapped warning counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProctorLog {
    events: VecDeque<ProctorEvent>,
    warnings: u32,
}

impl ProctorLog {
    pub const CAPACITY: usize = 50;

    /// Append an event, evicting the oldest past capacity.
    pub fn capture(&mut self, event: ProctorEvent) {
        if self.events.len() == Self::CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.warnings = self.warnings.saturating_add(1);
    }

    pub fn events(&self) -> impl Iterator<Item = &ProctorEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    /// The last `n` events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ProctorEvent> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.warnings = 0;
    }
}

/// What the environment should do with the action behind a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Allow,
    Suppress,
}

/// Handle given to an environment observer to report signals.
///
/// Cheap to clone. Becomes inert once the registration it belongs to is
/// released.
#[derive(Clone)]
pub struct SignalSink {
    log: Arc<Mutex<ProctorLog>>,
    live: Arc<AtomicBool>,
}

impl SignalSink {
    /// Report a signal observed now.
    pub fn emit(&self, kind: ProctorSignal, detail: impl Into<String>) -> Disposition {
        self.emit_at(kind, detail, Utc::now())
    }

    /// Report a signal with an explicit observation time.
    pub fn emit_at(
        &self,
        kind: ProctorSignal,
        detail: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Disposition {
        let mut log = lock(&self.log);
        // `live` only flips while the log lock is held.
        if !self.live.load(Ordering::Acquire) {
            return Disposition::Allow;
        }
        log.capture(ProctorEvent {
            kind,
            detail: detail.into(),
            at,
        });
        drop(log);
        if kind.suppresses_default() {
            Disposition::Suppress
        } else {
            Disposition::Allow
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Identifies one observer registration on a [`SignalSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// An environment able to deliver proctoring signals.
pub trait SignalSource: Send + Sync {
    /// Start delivering signals to `sink`.
    fn attach(&self, sink: SignalSink) -> ObserverId;

    /// Stop delivering signals for a registration.
    fn detach(&self, id: ObserverId);
}

/// Scoped observer registration. Detaches on drop.
pub struct ObserverGuard {
    source: Arc<dyn SignalSource>,
    id: ObserverId,
    log: Arc<Mutex<ProctorLog>>,
    live: Arc<AtomicBool>,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        {
            let _log = lock(&self.log);
            self.live.store(false, Ordering::Release);
        }
        self.source.detach(self.id);
        tracing::debug!(observer = self.id.0, "proctoring observer detached");
    }
}

/// Collects signals from a [`SignalSource`] into a [`ProctorLog`].
pub struct ProctorCollector {
    source: Arc<dyn SignalSource>,
    log: Arc<Mutex<ProctorLog>>,
    guard: Option<ObserverGuard>,
}

impl ProctorCollector {
    pub fn new(source: Arc<dyn SignalSource>) -> Self {
        Self {
            source,
            log: Arc::new(Mutex::new(ProctorLog::default())),
            guard: None,
        }
    }

    /// Attach an observer. No-op when already active.
    pub fn activate(&mut self) {
        if self.guard.is_some() {
            return;
        }
        let live = Arc::new(AtomicBool::new(true));
        let sink = SignalSink {
            log: Arc::clone(&self.log),
            live: Arc::clone(&live),
        };
        let id = self.source.attach(sink);
        tracing::debug!(observer = id.0, "proctoring observer attached");
        self.guard = Some(ObserverGuard {
            source: Arc::clone(&self.source),
            id,
            log: Arc::clone(&self.log),
            live,
        });
    }

    /// Detach the observer, keeping everything collected so far.
    pub fn deactivate(&mut self) {
        self.guard = None;
    }

    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }

    /// Drop all collected events and zero the warning counter.
    pub fn reset(&self) {
        lock(&self.log).clear();
    }

    pub fn warnings(&self) -> u32 {
        lock(&self.log).warnings()
    }

    pub fn events(&self) -> Vec<ProctorEvent> {
        lock(&self.log).events().cloned().collect()
    }

    pub fn recent(&self, n: usize) -> Vec<ProctorEvent> {
        lock(&self.log).recent(n)
    }

    pub fn summary(&self, enabled: bool) -> ProctorSummary {
        let log = lock(&self.log);
        ProctorSummary {
            enabled,
            warnings: log.warnings(),
            events: log.events().cloned().collect(),
        }
    }
}

fn lock(log: &Mutex<ProctorLog>) -> MutexGuard<'_, ProctorLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A [`SignalSource`] driven by explicit calls.
///
/// Used where signals come from an embedding surface that forwards events
/// one by one, and in tests.
#[derive(Default)]
pub struct ManualSignalSource {
    next_id: AtomicU64,
    observers: Mutex<HashMap<ObserverId, SignalSink>>,
}

impl ManualSignalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a signal to every attached observer.
    pub fn fire(&self, kind: ProctorSignal, detail: &str) -> Disposition {
        self.fire_at(kind, detail, Utc::now())
    }

    pub fn fire_at(&self, kind: ProctorSignal, detail: &str, at: DateTime<Utc>) -> Disposition {
        let sinks: Vec<SignalSink> = self.registry().values().cloned().collect();
        sinks
            .iter()
            .map(|sink| sink.emit_at(kind, detail, at))
            .fold(Disposition::Allow, |acc, d| {
                if d == Disposition::Suppress {
                    d
                } else {
                    acc
                }
            })
    }

    pub fn observer_count(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<ObserverId, SignalSink>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SignalSource for ManualSignalSource {
    fn attach(&self, sink: SignalSink) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry().insert(id, sink);
        id
    }

    fn detach(&self, id: ObserverId) {
        self.registry().remove(&id);
    }
}
