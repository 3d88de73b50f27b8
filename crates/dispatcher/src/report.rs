//! DispatchReport - what a finished dispatcher hands back to its caller

use std::fmt;

use contracts::{ActuatorId, SourceId};
use ingestion::WorkerReport;
use observability::DispatchSummary;

use crate::metrics::MetricsSnapshot;
use crate::state::DispatcherState;

/// Why the dispatcher left RUNNING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The abort signal fired
    Aborted,
    /// A source finished under `FirstFinished`
    SourceFinished(SourceId),
    /// Every expected source finished under `AllFinished`
    AllSourcesFinished,
    /// The stop signal was raised by someone else
    StopRequested,
    /// Every worker thread terminated without the policy firing
    WorkersExited,
    /// Routing panicked
    Panicked,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => f.write_str("aborted"),
            Self::SourceFinished(source) => write!(f, "{source} finished"),
            Self::AllSourcesFinished => f.write_str("all sources finished"),
            Self::StopRequested => f.write_str("stop requested"),
            Self::WorkersExited => f.write_str("workers exited"),
            Self::Panicked => f.write_str("panicked"),
        }
    }
}

/// A rejected actuator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorFailure {
    pub actuator: ActuatorId,
    pub message: String,
}

/// How a worker thread ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    Finished(WorkerReport),
    Panicked { source: SourceId, message: String },
}

impl WorkerOutcome {
    pub fn source(&self) -> SourceId {
        match self {
            Self::Finished(report) => report.source,
            Self::Panicked { source, .. } => *source,
        }
    }

    pub fn report(&self) -> Option<&WorkerReport> {
        match self {
            Self::Finished(report) => Some(report),
            Self::Panicked { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub stop_reason: StopReason,
    /// Every state visited, starting with `Running`
    pub transitions: Vec<DispatcherState>,
    pub counters: MetricsSnapshot,
    pub summary: DispatchSummary,
    /// Sources that reported `SourceFinished`, in arrival order
    pub finished_sources: Vec<SourceId>,
    pub workers: Vec<WorkerOutcome>,
    pub actuator_failures: Vec<ActuatorFailure>,
    /// Panic messages caught while routing
    pub panics: Vec<String>,
}

impl DispatchReport {
    pub fn final_state(&self) -> Option<DispatcherState> {
        self.transitions.last().copied()
    }

    /// No panics, no actuator failures
    pub fn is_clean(&self) -> bool {
        self.panics.is_empty()
            && self.actuator_failures.is_empty()
            && self
                .workers
                .iter()
                .all(|w| matches!(w, WorkerOutcome::Finished(_)))
    }

    pub fn worker(&self, source: SourceId) -> Option<&WorkerOutcome> {
        self.workers.iter().find(|w| w.source() == source)
    }
}
