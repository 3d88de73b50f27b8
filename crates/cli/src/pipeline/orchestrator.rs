//! Pipeline orchestrator - builds the line, runs it, stops it.
//!
//! Every worker is built and set up, and both sinks are created, before any
//! thread starts, so a bad input or device is reported before a loop runs. Once
//! started, the dispatcher owns shutdown; this side only raises the abort
//! flag on Ctrl-C, SIGTERM or `max_runtime`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::LineBlueprint;
use dispatcher::{
    create_actuator_sink, create_render_sink, DispatchReport, DispatcherBuilder, DispatcherConfig,
};
use event_queue::{AbortFlag, EventQueue, StopSignal};
use ingestion::{ReadyWorker, SensorWorker};
use tracing::{info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The line blueprint, overrides applied
    pub blueprint: LineBlueprint,

    /// Abort after this long (None = run until the shutdown policy fires)
    pub max_runtime: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the line to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Build everything first
        let render = create_render_sink(&blueprint.render).context("Failed to create render sink")?;
        let actuator =
            create_actuator_sink(&blueprint.actuator).context("Failed to create actuator sink")?;

        let pacing = blueprint.line.pacing();
        let workers = blueprint
            .sources
            .iter()
            .map(|source| {
                vision::build_worker(source, pacing)
                    .map_err(|e| CliError::source_start(source.id, e.to_string()))
            })
            .collect::<Result<Vec<SensorWorker>, CliError>>()?;

        info!(workers = workers.len(), "Line built");

        let queue = Arc::new(EventQueue::new());
        let stop = StopSignal::new();
        let abort = AbortFlag::new();

        let builder = DispatcherBuilder::new(Arc::clone(&queue), stop.clone())
            .config(DispatcherConfig {
                dequeue_timeout: blueprint.line.dequeue_timeout(),
                shutdown_policy: blueprint.line.shutdown_policy,
                expected_sources: blueprint.source_ids(),
            })
            .render_sink(render)
            .actuator_sink(actuator)
            .abort_signal(Box::new(abort.clone()));

        let builder = start_workers(builder, workers, &queue, &stop)?;
        let active_sources = blueprint.sources.len();

        let dispatcher = builder.build();
        let handle = dispatcher
            .spawn()
            .map_err(|e| CliError::dispatcher(e.to_string()))?;
        info!(active_sources, "Dispatcher started");

        let mut join = tokio::task::spawn_blocking(move || handle.join());

        let joined = tokio::select! {
            joined = &mut join => joined,
            trigger = shutdown_trigger(self.config.max_runtime) => {
                warn!(trigger, "Stopping line...");
                abort.trigger();
                join.await
            }
        };

        let report = joined
            .context("Dispatcher join task failed")?
            .map_err(|_| CliError::dispatcher("dispatcher thread panicked"))?;

        log_report(&report);

        Ok(PipelineStats::from_report(
            report,
            active_sources,
            start_time.elapsed(),
        ))
    }
}

/// Set up every worker, then spawn them
///
/// No loop starts until all setups succeeded. If one fails, the workers
/// already set up are dropped, releasing their sources, and the unrun
/// dispatcher closes the sinks. A thread that fails to spawn afterwards
/// stops the ones already running the same way.
fn start_workers(
    mut builder: DispatcherBuilder,
    workers: Vec<SensorWorker>,
    queue: &Arc<EventQueue>,
    stop: &StopSignal,
) -> Result<DispatcherBuilder, CliError> {
    let mut ready = Vec::with_capacity(workers.len());
    for worker in workers {
        let source = worker.source();
        match worker.setup() {
            Ok(worker) => ready.push(worker),
            Err(e) => {
                warn!(%source, error = %e, "Source failed setup, nothing started");
                drop(ready);
                drop(builder.build());
                return Err(CliError::source_start(source, e.to_string()));
            }
        }
    }

    for worker in ready {
        let source = worker.source();
        match worker.spawn(Arc::clone(queue), stop.clone()) {
            Ok(handle) => builder = builder.worker(handle),
            Err(e) => {
                warn!(%source, error = %e, "Worker thread failed to start, shutting the line down");
                drop(builder.build());
                return Err(CliError::source_start(source, e.to_string()));
            }
        }
    }
    Ok(builder)
}

/// Resolves when the line should be aborted from outside
async fn shutdown_trigger(max_runtime: Option<Duration>) -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        match max_runtime {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => "ctrl-c",
        _ = terminate => "sigterm",
        _ = deadline => "max runtime elapsed",
    }
}

fn log_report(report: &DispatchReport) {
    for failure in &report.actuator_failures {
        warn!(
            actuator = failure.actuator,
            error = %failure.message,
            "Actuator command failed"
        );
    }
    for panic in &report.panics {
        warn!(panic = %panic, "Dispatcher phase panicked");
    }
    info!(
        stop_reason = %report.stop_reason,
        final_state = ?report.final_state(),
        clean = report.is_clean(),
        "Line shutdown complete"
    );
}
