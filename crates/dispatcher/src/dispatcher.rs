//! Dispatcher - the single consumer of the event queue
//!
//! Routes every event by kind: frames to the render sink, commands to the
//! actuator sink, completions to the shutdown policy. Owns raising the stop
//! signal and the coordinated shutdown that follows it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{
    AbortSignal, ActuatorConfig, ActuatorId, ActuatorSink, DisplayKey, Event, Frame, NeverAbort,
    RenderConfig, RenderSink, ShutdownPolicy, SourceId,
};
use event_queue::{Dequeued, EventQueue, StopSignal};
use ingestion::{IngestionError, WorkerHandle};
use observability::{
    record_actuator_push, record_event_dispatched, record_queue_depth, record_render_failure,
    DispatchMetricsAggregator,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::report::{ActuatorFailure, DispatchReport, StopReason, WorkerOutcome};
use crate::sinks::{DeviceActuator, LogActuator, LogRenderSink, SnapshotRenderSink};
use crate::state::{DispatcherState, StateMachine};

/// Poll interval while waiting for workers to terminate
const STOPPING_POLL: Duration = Duration::from_millis(20);

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Bound on each blocking dequeue; also bounds abort-polling latency
    pub dequeue_timeout: Duration,

    /// When a `SourceFinished` stops the line
    pub shutdown_policy: ShutdownPolicy,

    /// Sources `AllFinished` waits for. Empty means the sources of the
    /// registered workers.
    pub expected_sources: Vec<SourceId>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            dequeue_timeout: Duration::from_secs(1),
            shutdown_policy: ShutdownPolicy::default(),
            expected_sources: Vec::new(),
        }
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    queue: Arc<EventQueue>,
    stop: StopSignal,
    render: Box<dyn RenderSink>,
    actuator: Box<dyn ActuatorSink>,
    abort: Box<dyn AbortSignal>,
    workers: Vec<WorkerHandle>,
}

impl DispatcherBuilder {
    /// Start from the shared queue and stop signal; sinks default to logging
    pub fn new(queue: Arc<EventQueue>, stop: StopSignal) -> Self {
        Self {
            config: DispatcherConfig::default(),
            queue,
            stop,
            render: Box::new(LogRenderSink::new("log")),
            actuator: Box::new(LogActuator::new("log")),
            abort: Box::new(NeverAbort),
            workers: Vec::new(),
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn render_sink(mut self, render: Box<dyn RenderSink>) -> Self {
        self.render = render;
        self
    }

    pub fn actuator_sink(mut self, actuator: Box<dyn ActuatorSink>) -> Self {
        self.actuator = actuator;
        self
    }

    pub fn abort_signal(mut self, abort: Box<dyn AbortSignal>) -> Self {
        self.abort = abort;
        self
    }

    pub fn worker(mut self, worker: WorkerHandle) -> Self {
        self.workers.push(worker);
        self
    }

    pub fn workers(mut self, workers: impl IntoIterator<Item = WorkerHandle>) -> Self {
        self.workers.extend(workers);
        self
    }

    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(workers = self.workers.len(), policy = ?self.config.shutdown_policy)
    )]
    pub fn build(self) -> Dispatcher {
        let mut config = self.config;
        if config.expected_sources.is_empty() {
            config.expected_sources = self.workers.iter().map(WorkerHandle::source).collect();
        }

        info!(
            render = %self.render.name(),
            actuator = %self.actuator.name(),
            expected_sources = ?config.expected_sources,
            "dispatcher built"
        );

        Dispatcher {
            config,
            queue: self.queue,
            stop: self.stop,
            render: self.render,
            actuator: self.actuator,
            abort: self.abort,
            workers: self.workers,
            metrics: Arc::new(DispatchMetrics::new()),
            aggregator: DispatchMetricsAggregator::new(),
            state: StateMachine::new(),
            stop_reason: None,
            finished: Vec::new(),
            actuator_failures: Vec::new(),
            panics: Vec::new(),
            sinks_closed: false,
        }
    }
}

/// Create the render sink named by the configuration
#[instrument(name = "dispatcher_create_render_sink", skip(config))]
pub fn create_render_sink(config: &RenderConfig) -> Result<Box<dyn RenderSink>, DispatcherError> {
    match config {
        RenderConfig::Log => Ok(Box::new(LogRenderSink::new("log"))),
        RenderConfig::Snapshot { dir } => {
            let sink = SnapshotRenderSink::new("snapshot", dir)
                .map_err(|e| DispatcherError::sink_creation("snapshot", e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

/// Create the actuator sink named by the configuration
#[instrument(name = "dispatcher_create_actuator_sink", skip(config))]
pub fn create_actuator_sink(
    config: &ActuatorConfig,
) -> Result<Box<dyn ActuatorSink>, DispatcherError> {
    match config {
        ActuatorConfig::Log => Ok(Box::new(LogActuator::new("log"))),
        ActuatorConfig::Device { path } => {
            let sink = DeviceActuator::open("device", path)
                .map_err(|e| DispatcherError::sink_creation("device", e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

/// The single consumer
///
/// Exclusively owns both sinks and the worker handles. Sinks are released
/// only after every worker thread has been joined.
pub struct Dispatcher {
    config: DispatcherConfig,
    queue: Arc<EventQueue>,
    stop: StopSignal,
    render: Box<dyn RenderSink>,
    actuator: Box<dyn ActuatorSink>,
    abort: Box<dyn AbortSignal>,
    workers: Vec<WorkerHandle>,
    metrics: Arc<DispatchMetrics>,
    aggregator: DispatchMetricsAggregator,
    state: StateMachine,
    stop_reason: Option<StopReason>,
    finished: Vec<SourceId>,
    actuator_failures: Vec<ActuatorFailure>,
    panics: Vec<String>,
    sinks_closed: bool,
}

impl Dispatcher {
    /// Shared counters, readable while the dispatcher runs
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn state(&self) -> DispatcherState {
        self.state.current()
    }

    /// Run the dispatch loop and the shutdown that follows it
    ///
    /// Returns once every worker has been joined, the queue drained and both
    /// sinks released.
    #[instrument(name = "dispatcher_run", skip(self), fields(policy = ?self.config.shutdown_policy))]
    pub fn run(mut self) -> DispatchReport {
        info!(workers = self.workers.len(), "dispatcher started");

        // RUNNING
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.route_until_stop())) {
            self.on_panic("running", payload);
        }

        // STOPPING
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.route_until_workers_exit()))
        {
            self.on_panic("stopping", payload);
        }
        let workers = self.join_workers();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.drain_remaining())) {
            self.on_panic("draining", payload);
        }

        self.close_sinks();
        self.enter(DispatcherState::Closed);

        let report = DispatchReport {
            stop_reason: self.stop_reason.unwrap_or(StopReason::StopRequested),
            transitions: self.state.trail().to_vec(),
            counters: self.metrics.snapshot(),
            summary: self.aggregator.summary(),
            finished_sources: std::mem::take(&mut self.finished),
            workers,
            actuator_failures: std::mem::take(&mut self.actuator_failures),
            panics: std::mem::take(&mut self.panics),
        };

        info!(
            reason = %report.stop_reason,
            routed = report.counters.total_routed(),
            after_stop = report.counters.routed_after_stop,
            actuator_failures = report.actuator_failures.len(),
            "dispatcher closed"
        );
        report
    }

    /// Run on a dedicated OS thread named `dispatcher`
    ///
    /// # Errors
    /// `Spawn` if the thread cannot be created; the dispatcher is then dropped,
    /// which stops and joins the workers and releases the sinks.
    pub fn spawn(self) -> Result<JoinHandle<DispatchReport>, DispatcherError> {
        thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || self.run())
            .map_err(DispatcherError::Spawn)
    }

    fn route_until_stop(&mut self) {
        while self.state.current() == DispatcherState::Running {
            if self.abort.abort_requested() {
                info!("abort requested");
                self.begin_stop(StopReason::Aborted);
                break;
            }
            if self.stop.is_set() {
                self.begin_stop(StopReason::StopRequested);
                break;
            }

            match self.queue.dequeue(self.config.dequeue_timeout) {
                Dequeued::Event(event) => self.route(event),
                Dequeued::TimedOut => {
                    self.metrics.inc_dequeue_timeouts();
                    if self.workers_exited() {
                        warn!("every worker exited without stopping the line");
                        self.begin_stop(StopReason::WorkersExited);
                    }
                }
            }
        }
    }

    /// Keep routing until every worker thread has terminated
    fn route_until_workers_exit(&mut self) {
        if self.state.current() == DispatcherState::Running {
            self.begin_stop(StopReason::Panicked);
        }
        let poll = self.config.dequeue_timeout.min(STOPPING_POLL);
        while !self.workers_exited() {
            if let Dequeued::Event(event) = self.queue.dequeue(poll) {
                self.route(event);
            }
        }
    }

    /// Route whatever is still queued after the join
    fn drain_remaining(&mut self) {
        let mut drained = 0u64;
        while let Some(event) = self.queue.try_dequeue() {
            self.route(event);
            drained += 1;
        }
        debug!(drained, "queue drained");
    }

    fn route(&mut self, event: Event) {
        let kind = event.kind();
        let after_stop = self.state.current() != DispatcherState::Running;

        self.metrics.inc_routed(kind);
        if after_stop {
            self.metrics.inc_routed_after_stop();
        }
        self.aggregator.record_kind(kind, event.source());
        record_event_dispatched(kind, after_stop);

        match event {
            Event::RawFrame { source, frame } => self.show(DisplayKey::live(source), &frame),
            Event::DetectedFrame { source, frame } => {
                self.show(DisplayKey::detected(source), &frame)
            }
            Event::ActuatorCommand { actuator } => self.push(actuator),
            Event::SourceFinished { source } => self.source_finished(source),
        }
    }

    fn show(&mut self, key: DisplayKey, frame: &Frame) {
        let started = Instant::now();
        match self.render.show(&key, frame) {
            Ok(()) => self
                .aggregator
                .record_render_ms(started.elapsed().as_secs_f64() * 1000.0),
            Err(e) => {
                self.metrics.inc_render_failures();
                record_render_failure(&key.slug());
                warn!(display = %key, seq = frame.seq, error = %e, "render failed");
            }
        }
    }

    fn push(&mut self, actuator: ActuatorId) {
        let started = Instant::now();
        let result = self.actuator.push(actuator);
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_actuator_push(actuator, result.is_ok(), latency_ms);

        match result {
            Ok(()) => {
                self.aggregator.record_actuator_ms(actuator, latency_ms);
                debug!(actuator, latency_ms, "actuator pushed");
            }
            Err(e) => {
                self.metrics.inc_actuator_failures();
                error!(actuator, error = %e, "actuator push failed");
                self.actuator_failures.push(ActuatorFailure {
                    actuator,
                    message: e.to_string(),
                });
            }
        }
    }

    fn source_finished(&mut self, source: SourceId) {
        if !self.finished.contains(&source) {
            self.finished.push(source);
        }
        info!(source = %source, finished = self.finished.len(), "source finished");

        if self.state.current() != DispatcherState::Running {
            return;
        }
        match self.config.shutdown_policy {
            ShutdownPolicy::FirstFinished => self.begin_stop(StopReason::SourceFinished(source)),
            ShutdownPolicy::AllFinished => {
                let finished = &self.finished;
                if self.config.expected_sources.iter().all(|s| finished.contains(s)) {
                    self.begin_stop(StopReason::AllSourcesFinished);
                }
            }
        }
    }

    /// RUNNING -> STOPPING, raising the stop signal
    fn begin_stop(&mut self, reason: StopReason) {
        if self.state.current() != DispatcherState::Running {
            return;
        }
        self.stop.request();
        self.stop_reason = Some(reason);
        self.enter(DispatcherState::Stopping);
        record_queue_depth(self.queue.len());
        info!(reason = %reason, queued = self.queue.len(), "stopping");
    }

    fn enter(&mut self, next: DispatcherState) {
        if let Err(e) = self.state.transition(next) {
            warn!(error = %e, "state transition rejected");
        }
    }

    fn workers_exited(&self) -> bool {
        self.workers.iter().all(WorkerHandle::is_finished)
    }

    fn join_workers(&mut self) -> Vec<WorkerOutcome> {
        std::mem::take(&mut self.workers)
            .into_iter()
            .map(|handle| {
                let source = handle.source();
                match handle.join() {
                    Ok(report) => {
                        debug!(source = %source, exit = report.exit.as_str(), "worker joined");
                        WorkerOutcome::Finished(report)
                    }
                    Err(IngestionError::WorkerPanicked { message, .. }) => {
                        WorkerOutcome::Panicked { source, message }
                    }
                    Err(other) => WorkerOutcome::Panicked {
                        source,
                        message: other.to_string(),
                    },
                }
            })
            .collect()
    }

    /// Release the render sink, then close the actuator sink. Runs once.
    fn close_sinks(&mut self) {
        if self.sinks_closed {
            return;
        }
        self.sinks_closed = true;

        if let Err(e) = self.render.release() {
            warn!(sink = %self.render.name(), error = %e, "render sink release failed");
        }
        if let Err(e) = self.actuator.close() {
            warn!(sink = %self.actuator.name(), error = %e, "actuator close failed");
        }
    }

    fn on_panic(&mut self, phase: &'static str, payload: Box<dyn std::any::Any + Send>) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(phase, message = %message, "dispatcher panicked, shutting down");
        self.panics.push(message);
        self.stop.request();
        if self.state.current() == DispatcherState::Running {
            self.stop_reason = Some(StopReason::Panicked);
            self.enter(DispatcherState::Stopping);
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if self.sinks_closed {
            return;
        }
        warn!("dispatcher dropped without running, shutting down");
        self.stop.request();
        for handle in std::mem::take(&mut self.workers) {
            if let Err(e) = handle.join() {
                error!(error = %e, "worker failed during teardown");
            }
        }
        self.close_sinks();
    }
}
