//! In-process dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::EventKind;

/// Counters shared between the dispatcher thread and observers
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    raw_frames: AtomicU64,
    detected_frames: AtomicU64,
    actuator_commands: AtomicU64,
    sources_finished: AtomicU64,
    render_failures: AtomicU64,
    actuator_failures: AtomicU64,
    dequeue_timeouts: AtomicU64,
    routed_after_stop: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one routed event
    pub fn inc_routed(&self, kind: EventKind) {
        let counter = match kind {
            EventKind::RawFrame => &self.raw_frames,
            EventKind::DetectedFrame => &self.detected_frames,
            EventKind::ActuatorCommand => &self.actuator_commands,
            EventKind::SourceFinished => &self.sources_finished,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_render_failures(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_actuator_failures(&self) {
        self.actuator_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dequeue_timeouts(&self) {
        self.dequeue_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_routed_after_stop(&self) {
        self.routed_after_stop.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            raw_frames: self.raw_frames.load(Ordering::Relaxed),
            detected_frames: self.detected_frames.load(Ordering::Relaxed),
            actuator_commands: self.actuator_commands.load(Ordering::Relaxed),
            sources_finished: self.sources_finished.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            actuator_failures: self.actuator_failures.load(Ordering::Relaxed),
            dequeue_timeouts: self.dequeue_timeouts.load(Ordering::Relaxed),
            routed_after_stop: self.routed_after_stop.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub raw_frames: u64,
    pub detected_frames: u64,
    pub actuator_commands: u64,
    pub sources_finished: u64,
    pub render_failures: u64,
    pub actuator_failures: u64,
    pub dequeue_timeouts: u64,
    pub routed_after_stop: u64,
}

impl MetricsSnapshot {
    /// Events routed, all kinds
    pub fn total_routed(&self) -> u64 {
        self.raw_frames + self.detected_frames + self.actuator_commands + self.sources_finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind() {
        let metrics = DispatchMetrics::new();
        metrics.inc_routed(EventKind::RawFrame);
        metrics.inc_routed(EventKind::RawFrame);
        metrics.inc_routed(EventKind::ActuatorCommand);
        metrics.inc_actuator_failures();

        let snap = metrics.snapshot();
        assert_eq!(snap.raw_frames, 2);
        assert_eq!(snap.actuator_commands, 1);
        assert_eq!(snap.actuator_failures, 1);
        assert_eq!(snap.total_routed(), 3);
    }
}
