//! SensorWorker - per-source capture / detect / decide loop

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{ActuatorId, Event, Frame, FrameSource, RegionDetector, SourceId};
use event_queue::{EventQueue, StopSignal};
use observability::{record_detection_error, record_worker_exit};
use tracing::{debug, error, info, instrument, warn};

use crate::decision::{Decision, DecisionStage};
use crate::error::{IngestionError, Result};

/// Per-worker configuration, supplied as plain data at construction
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Source label carried by every event this worker produces
    pub source: SourceId,

    /// Actuator named in this worker's commands
    pub actuator: ActuatorId,

    /// Delay before each iteration; caps CPU and queue pressure
    pub pacing: Duration,
}

impl WorkerConfig {
    /// Config with the default 30 ms pacing
    pub fn new(source: SourceId, actuator: ActuatorId) -> Self {
        Self {
            source,
            actuator,
            pacing: Duration::from_millis(30),
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

/// Why a worker loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Input ran out; `SourceFinished` was enqueued
    Exhausted,
    /// Stop signal observed; nothing further was enqueued
    Stopped,
}

impl WorkerExit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::Stopped => "stopped",
        }
    }
}

/// Counters returned when a worker terminates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub source: SourceId,
    /// Frames acquired (one `RawFrame` each)
    pub frames: u64,
    /// Regions detected (one `DetectedFrame` each)
    pub detections: u64,
    /// `ActuatorCommand`s enqueued
    pub commands: u64,
    /// Iterations skipped after a detection / classification error
    pub detection_errors: u64,
    pub exit: WorkerExit,
}

impl WorkerReport {
    fn new(source: SourceId) -> Self {
        Self {
            source,
            frames: 0,
            detections: 0,
            commands: 0,
            detection_errors: 0,
            exit: WorkerExit::Stopped,
        }
    }
}

/// Owns the frame source and releases it on every exit path, unwinding included
struct SourceGuard {
    inner: Box<dyn FrameSource>,
    released: bool,
}

impl SourceGuard {
    fn new(inner: Box<dyn FrameSource>) -> Self {
        Self {
            inner,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.inner.release();
            debug!(source = %self.inner.name(), "frame source released");
        }
    }
}

impl std::ops::Deref for SourceGuard {
    type Target = dyn FrameSource;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::ops::DerefMut for SourceGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// One sensing pipeline
///
/// Only ever writes to the event queue and reads the stop signal.
pub struct SensorWorker {
    config: WorkerConfig,
    frame_source: SourceGuard,
    detector: Box<dyn RegionDetector>,
    decision: DecisionStage,
}

impl SensorWorker {
    pub fn new(
        config: WorkerConfig,
        frame_source: Box<dyn FrameSource>,
        detector: Box<dyn RegionDetector>,
        decision: DecisionStage,
    ) -> Self {
        Self {
            config,
            frame_source: SourceGuard::new(frame_source),
            detector,
            decision,
        }
    }

    pub fn source(&self) -> SourceId {
        self.config.source
    }

    /// Make every collaborator ready without starting anything
    ///
    /// # Errors
    /// The first failing `open` / `prepare`; the frame source is released
    /// when the worker is dropped.
    #[instrument(name = "sensor_worker_setup", skip(self), fields(source = %self.config.source))]
    pub fn setup(mut self) -> Result<ReadyWorker> {
        let source = self.config.source;
        self.frame_source
            .open()
            .map_err(|e| IngestionError::setup(source, "frame source", e))?;
        self.detector
            .prepare()
            .map_err(|e| IngestionError::setup(source, "detector", e))?;
        self.decision
            .prepare()
            .map_err(|e| IngestionError::setup(source, "decision", e))?;
        debug!(source = %source, "sensor worker ready");
        Ok(ReadyWorker { worker: self })
    }

    /// `setup` followed by `ReadyWorker::spawn`
    pub fn spawn(self, queue: Arc<EventQueue>, stop: StopSignal) -> Result<WorkerHandle> {
        self.setup()?.spawn(queue, stop)
    }

    /// Setup and loop on the calling thread
    pub fn run_blocking(self, queue: &EventQueue, stop: &StopSignal) -> Result<WorkerReport> {
        Ok(self.setup()?.worker.run_loop(queue, stop))
    }

    fn run_loop(mut self, queue: &EventQueue, stop: &StopSignal) -> WorkerReport {
        let source = self.config.source;
        info!(
            source = %source,
            frame_source = %self.frame_source.name(),
            rule = %self.decision.describe(),
            actuator = self.config.actuator,
            "sensor worker started"
        );

        let mut report = WorkerReport::new(source);

        let exit = loop {
            if stop.is_set() {
                break WorkerExit::Stopped;
            }

            if !self.config.pacing.is_zero() {
                thread::sleep(self.config.pacing);
            }

            let frame = match self.frame_source.acquire() {
                Ok(Some(frame)) => frame,
                Ok(None) => break WorkerExit::Exhausted,
                Err(e) => {
                    warn!(source = %source, error = %e, "frame read failed, treating input as exhausted");
                    break WorkerExit::Exhausted;
                }
            };

            report.frames += 1;
            queue.enqueue(Event::raw_frame(source, frame.clone()));
            self.process(&frame, queue, &mut report);
        };

        if exit == WorkerExit::Exhausted {
            queue.enqueue(Event::source_finished(source));
        }

        self.frame_source.release();
        report.exit = exit;
        record_worker_exit(source, exit.as_str());

        info!(
            source = %source,
            exit = exit.as_str(),
            frames = report.frames,
            detections = report.detections,
            commands = report.commands,
            detection_errors = report.detection_errors,
            "sensor worker stopped"
        );

        report
    }

    /// Detection and decision for one input unit
    fn process(&mut self, frame: &Frame, queue: &EventQueue, report: &mut WorkerReport) {
        let source = self.config.source;

        let region = match self.detector.detect(frame) {
            Ok(Some(region)) => region,
            Ok(None) => return,
            Err(e) => {
                report.detection_errors += 1;
                record_detection_error(source);
                warn!(source = %source, seq = frame.seq, error = %e, "detection failed, skipping frame");
                return;
            }
        };

        report.detections += 1;
        queue.enqueue(Event::detected_frame(source, region.frame.clone()));

        match self.decision.decide(&region) {
            Ok(Decision::Actuate) => {
                report.commands += 1;
                queue.enqueue(Event::actuator_command(self.config.actuator));
                info!(source = %source, seq = frame.seq, actuator = self.config.actuator, "reject item");
            }
            Ok(Decision::Pass) => {
                debug!(source = %source, seq = frame.seq, "pass item");
            }
            Err(e) => {
                report.detection_errors += 1;
                record_detection_error(source);
                warn!(source = %source, seq = frame.seq, error = %e, "classification failed, skipping frame");
            }
        }
    }
}

impl std::fmt::Debug for SensorWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorWorker")
            .field("config", &self.config)
            .field("frame_source", &self.frame_source.name())
            .field("decision", &self.decision)
            .finish()
    }
}

/// A worker whose collaborators are all ready and whose loop has not started
///
/// Dropping it releases the frame source.
#[derive(Debug)]
pub struct ReadyWorker {
    worker: SensorWorker,
}

impl ReadyWorker {
    pub fn source(&self) -> SourceId {
        self.worker.config.source
    }

    /// Start the loop on a thread named `sensor-{source}`
    pub fn spawn(self, queue: Arc<EventQueue>, stop: StopSignal) -> Result<WorkerHandle> {
        let source = self.source();
        let worker = self.worker;
        let join = thread::Builder::new()
            .name(format!("sensor-{source}"))
            .spawn(move || worker.run_loop(&queue, &stop))
            .map_err(|e| IngestionError::spawn(source, e))?;

        Ok(WorkerHandle { source, join })
    }
}

/// Handle to a running worker thread
#[derive(Debug)]
pub struct WorkerHandle {
    source: SourceId,
    join: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Whether the worker thread has terminated (normally or by panic)
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker thread
    ///
    /// # Errors
    /// `WorkerPanicked` if the loop panicked; its frame source was still released.
    pub fn join(self) -> Result<WorkerReport> {
        self.join.join().map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(source = %self.source, message = %message, "worker panicked");
            IngestionError::WorkerPanicked {
                source_id: self.source,
                message,
            }
        })
    }
}
