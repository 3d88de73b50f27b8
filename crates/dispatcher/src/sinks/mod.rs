//! Sink implementations
//!
//! Render: LogRenderSink, SnapshotRenderSink, MemoryRenderSink.
//! Actuator: LogActuator, DeviceActuator, MemoryActuator.

mod device;
mod log;
mod memory;
mod snapshot;

pub use self::device::DeviceActuator;
pub use self::log::{LogActuator, LogRenderSink};
pub use self::memory::{MemoryActuator, MemoryRenderSink, SinkEvent, SinkJournal};
pub use self::snapshot::SnapshotRenderSink;
