//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the sorting line.
//! Business crates only depend on this crate; reverse dependencies are prohibited.
//!
//! ## Event Model
//! - Two sensing pipelines (sources 1 and 2) produce [`Event`]s
//! - A single dispatcher consumes them and drives the render / actuator sinks
//! - External collaborators (cameras, detectors, classifiers, sinks) are traits

mod blueprint;
mod collaborator;
mod error;
mod event;
mod frame;
mod sink;
mod source_id;

pub use blueprint::*;
pub use collaborator::*;
pub use error::*;
pub use event::*;
pub use frame::*;
pub use sink::*;
pub use source_id::{ActuatorId, SourceId};
