//! Pipeline statistics from a finished run.

use std::time::Duration;

use dispatcher::{ActuatorFailure, DispatchReport, MetricsSnapshot, StopReason, WorkerOutcome};
use observability::DispatchSummary;

use crate::error::CliError;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Why the dispatcher stopped
    pub stop_reason: StopReason,

    /// Events routed per kind
    pub counters: MetricsSnapshot,

    /// Per-source / per-actuator breakdown with latencies
    pub summary: DispatchSummary,

    /// How each worker ended
    pub workers: Vec<WorkerOutcome>,

    pub actuator_failures: Vec<ActuatorFailure>,

    /// Panics caught in dispatcher phases and worker threads
    pub panics: Vec<String>,

    /// Number of sources that were started
    pub active_sources: usize,

    /// Total duration of the run
    pub duration: Duration,
}

impl PipelineStats {
    pub fn from_report(report: DispatchReport, active_sources: usize, duration: Duration) -> Self {
        let mut panics = report.panics;
        panics.extend(report.workers.iter().filter_map(|w| match w {
            WorkerOutcome::Panicked { source, message } => Some(format!("{source}: {message}")),
            WorkerOutcome::Finished(_) => None,
        }));

        Self {
            stop_reason: report.stop_reason,
            counters: report.counters,
            summary: report.summary,
            workers: report.workers,
            actuator_failures: report.actuator_failures,
            panics,
            active_sources,
            duration,
        }
    }

    /// Raw frames routed per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.counters.raw_frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// A run that panicked anywhere is a failed run
    pub fn ensure_no_panics(&self) -> Result<(), CliError> {
        match self.panics.first() {
            None => Ok(()),
            Some(first) => Err(CliError::Panicked {
                count: self.panics.len(),
                first: first.clone(),
            }),
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Line Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let c = &self.counters;
        println!("📊 Overview");
        println!("   ├─ Stop reason: {}", self.stop_reason);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Raw frames: {} ({:.2} fps)", c.raw_frames, self.fps());
        println!("   ├─ Detected frames: {}", c.detected_frames);
        println!("   ├─ Actuator commands: {}", c.actuator_commands);
        println!("   ├─ Routed after stop: {}", c.routed_after_stop);
        println!("   ├─ Dequeue timeouts: {}", c.dequeue_timeouts);
        println!("   └─ Active sources: {}", self.active_sources);

        println!("\n📷 Workers");
        for (i, worker) in self.workers.iter().enumerate() {
            let prefix = if i == self.workers.len() - 1 { "└─" } else { "├─" };
            match worker {
                WorkerOutcome::Finished(r) => println!(
                    "   {} {}: {} frames, {} detections, {} commands, {} errors ({})",
                    prefix,
                    r.source,
                    r.frames,
                    r.detections,
                    r.commands,
                    r.detection_errors,
                    r.exit.as_str()
                ),
                WorkerOutcome::Panicked { source, message } => {
                    println!("   {} {}: panicked: {}", prefix, source, message)
                }
            }
        }

        println!("\n⏱  Latency (ms)");
        println!("   ├─ Render: {}", self.summary.render_ms);
        println!("   └─ Actuator: {}", self.summary.actuator_ms);

        if c.render_failures > 0 || !self.actuator_failures.is_empty() {
            println!("\n⚠️  Failures");
            println!("   ├─ Render: {}", c.render_failures);
            println!("   └─ Actuator: {}", self.actuator_failures.len());
        }

        if !self.panics.is_empty() {
            println!("\n💥 Panics");
            for panic in &self.panics {
                println!("   - {}", panic);
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceId;
    use dispatcher::DispatcherState;
    use ingestion::{WorkerExit, WorkerReport};

    fn report(workers: Vec<WorkerOutcome>) -> DispatchReport {
        DispatchReport {
            stop_reason: StopReason::AllSourcesFinished,
            transitions: vec![
                DispatcherState::Running,
                DispatcherState::Stopping,
                DispatcherState::Closed,
            ],
            counters: MetricsSnapshot {
                raw_frames: 10,
                ..Default::default()
            },
            summary: DispatchSummary::default(),
            finished_sources: vec![SourceId::new(1)],
            workers,
            actuator_failures: Vec::new(),
            panics: Vec::new(),
        }
    }

    #[test]
    fn test_fps_and_clean_run() {
        let worker = WorkerOutcome::Finished(WorkerReport {
            source: SourceId::new(1),
            frames: 10,
            detections: 0,
            commands: 0,
            detection_errors: 0,
            exit: WorkerExit::Exhausted,
        });
        let stats = PipelineStats::from_report(report(vec![worker]), 1, Duration::from_secs(2));
        assert_eq!(stats.fps(), 5.0);
        assert!(stats.ensure_no_panics().is_ok());
    }

    #[test]
    fn test_worker_panic_fails_the_run() {
        let worker = WorkerOutcome::Panicked {
            source: SourceId::new(2),
            message: "boom".to_string(),
        };
        let stats = PipelineStats::from_report(report(vec![worker]), 1, Duration::ZERO);
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.panics, vec!["cam2: boom".to_string()]);
        assert!(matches!(
            stats.ensure_no_panics(),
            Err(CliError::Panicked { count: 1, .. })
        ));
    }
}
