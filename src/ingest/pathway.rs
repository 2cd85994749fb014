//! Per-pathway request state
//!
//! Each ingestion pathway moves `Idle -> Submitting -> Succeeded | Failed`
//! and is back at `Idle` once the submitting call returns its outcome.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use log::debug;

/// The three ways a tool can enter the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathwayKind {
    /// Raw source text for one tool
    Paste,
    /// Natural-language description turned into source
    Prompt,
    /// Repository file reference
    GitImport,
}

impl PathwayKind {
    /// Message used when a failure carries no backend detail
    pub fn fallback_message(&self) -> &'static str {
        match self {
            PathwayKind::Paste => "Failed to add tool",
            PathwayKind::Prompt => "Failed to generate code",
            PathwayKind::GitImport => "Failed to add tool from git",
        }
    }

    /// Message used when the required input is blank
    pub fn empty_input_message(&self) -> &'static str {
        match self {
            PathwayKind::Paste => "Tool source must not be empty",
            PathwayKind::Prompt => "Tool description must not be empty",
            PathwayKind::GitImport => "Git URL must not be empty",
        }
    }
}

impl fmt::Display for PathwayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathwayKind::Paste => "paste",
            PathwayKind::Prompt => "prompt",
            PathwayKind::GitImport => "git-import",
        };
        f.write_str(name)
    }
}

/// Position of a pathway in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathwayStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl PathwayStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Read-only copy of a pathway's state for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwaySnapshot {
    pub kind: PathwayKind,
    pub status: PathwayStatus,
    /// At least one request of this pathway is in flight
    pub loading: bool,
    /// Current contents of the pathway's input buffer
    pub input: String,
    /// Message of the most recent failure, cleared by the next submission
    pub error: Option<String>,
    /// Terminal state reached by the most recent submission
    pub last_outcome: Option<PathwayStatus>,
}

/// Mutable state of one pathway, owned by the pipeline
#[derive(Debug)]
pub(crate) struct PathwayState {
    kind: PathwayKind,
    status: PathwayStatus,
    in_flight: usize,
    pub(crate) input: String,
    error: Option<String>,
    last_outcome: Option<PathwayStatus>,
}

impl PathwayState {
    pub(crate) fn new(kind: PathwayKind) -> Self {
        Self {
            kind,
            status: PathwayStatus::Idle,
            in_flight: 0,
            input: String::new(),
            error: None,
            last_outcome: None,
        }
    }

    /// A request is about to go out
    pub(crate) fn begin(&mut self) {
        self.in_flight += 1;
        self.error = None;
        self.transition(PathwayStatus::Submitting);
    }

    /// The request succeeded
    pub(crate) fn succeed(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.finish(PathwayStatus::Succeeded);
    }

    /// The request failed with a user-facing message
    pub(crate) fn fail(&mut self, message: String) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.error = Some(message);
        self.finish(PathwayStatus::Failed);
    }

    /// The request was dropped before it returned an outcome
    pub(crate) fn abandon(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.transition(PathwayStatus::Idle);
        }
    }

    /// Input was rejected before any request was made
    pub(crate) fn reject(&mut self, message: String) {
        self.error = Some(message);
        self.finish(PathwayStatus::Failed);
    }

    pub(crate) fn snapshot(&self) -> PathwaySnapshot {
        PathwaySnapshot {
            kind: self.kind,
            status: self.status,
            loading: self.in_flight > 0,
            input: self.input.clone(),
            error: self.error.clone(),
            last_outcome: self.last_outcome,
        }
    }

    /// Record the terminal state, then hand the pathway back to idle unless
    /// another request of the same pathway is still running
    fn finish(&mut self, outcome: PathwayStatus) {
        self.transition(outcome);
        self.last_outcome = Some(outcome);
        if self.in_flight > 0 {
            self.transition(PathwayStatus::Submitting);
        } else {
            self.transition(PathwayStatus::Idle);
        }
    }

    fn transition(&mut self, next: PathwayStatus) {
        if self.status != next {
            debug!("{} pathway: {:?} -> {:?}", self.kind, self.status, next);
            self.status = next;
        }
    }
}

/// Lock a pathway, recovering the state if a holder panicked
pub(crate) fn lock(pathway: &Mutex<PathwayState>) -> MutexGuard<'_, PathwayState> {
    pathway.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One in-flight request of a pathway.
///
/// Settling with `succeed` or `fail` records the outcome. Dropping an
/// unsettled guard (cancelled or timed-out future) releases the request
/// without an outcome, so `loading` never sticks.
pub(crate) struct InFlight<'a> {
    pathway: &'a Mutex<PathwayState>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    pub(crate) fn begin(pathway: &'a Mutex<PathwayState>) -> Self {
        lock(pathway).begin();
        Self { pathway, settled: false }
    }

    /// Record success after `update` has adjusted the state
    pub(crate) fn succeed(mut self, update: impl FnOnce(&mut PathwayState)) {
        let mut state = lock(self.pathway);
        update(&mut state);
        state.succeed();
        self.settled = true;
    }

    pub(crate) fn fail(mut self, message: String) {
        lock(self.pathway).fail(message);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = lock(self.pathway);
            debug!("{} request dropped before completion", state.kind);
            state.abandon();
        }
    }
}
