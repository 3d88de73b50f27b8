//! Dispatcher output interfaces
//!
//! The dispatcher exclusively owns one render sink and one actuator sink.
//! Both are called synchronously from the dispatcher thread.

use crate::{ActuatorId, ContractError, DisplayKey, Frame};

/// Live display output
///
/// All sink implementations must tolerate repeated `show` calls with the same key.
pub trait RenderSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Show `frame` in the display identified by `key`
    ///
    /// # Errors
    /// Returns a render error; the dispatcher logs it and moves on.
    fn show(&mut self, key: &DisplayKey, frame: &Frame) -> Result<(), ContractError>;

    /// Release all display resources
    fn release(&mut self) -> Result<(), ContractError>;
}

/// Physical actuator output
pub trait ActuatorSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Move actuator `id`. Blocks until the command is accepted.
    fn push(&mut self, id: ActuatorId) -> Result<(), ContractError>;

    /// Stop the line and close the device. Called once at shutdown.
    fn close(&mut self) -> Result<(), ContractError>;
}

/// Externally-driven quit request, polled once per dispatcher iteration
pub trait AbortSignal: Send {
    fn abort_requested(&mut self) -> bool;
}

/// Abort signal that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAbort;

impl AbortSignal for NeverAbort {
    fn abort_requested(&mut self) -> bool {
        false
    }
}
