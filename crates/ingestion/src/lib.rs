//! # Ingestion
//!
//! Sensor worker module: the producer side of the event queue.
//!
//! Responsibilities:
//! - Run one capture -> detect -> decide loop per source on its own OS thread
//! - Enqueue `RawFrame`, `DetectedFrame`, `ActuatorCommand` and `SourceFinished` events
//! - Observe the cooperative `StopSignal` at every iteration boundary
//! - Fail fast when a collaborator is unavailable at start, before any loop runs
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{DecisionStage, SensorWorker, WorkerConfig};
//!
//! let worker = SensorWorker::new(
//!     WorkerConfig::new(SourceId::new(1), 1),
//!     Box::new(camera),
//!     Box::new(motion_detector),
//!     DecisionStage::defect(Box::new(model), "x", 0.8),
//! );
//! let ready = worker.setup()?; // open / prepare, nothing enqueued yet
//! let handle = ready.spawn(Arc::clone(&queue), stop.clone())?;
//! // ...
//! let report = handle.join()?;
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::mock::{ScriptedDetector, ScriptedFrameSource, FixedInference};
//! ```

mod decision;
mod error;
pub mod mock;
mod worker;

// Re-exports
pub use decision::{defect_rule_met, Decision, DecisionStage};
pub use error::{IngestionError, Result};
pub use worker::{ReadyWorker, SensorWorker, WorkerConfig, WorkerExit, WorkerHandle, WorkerReport};
