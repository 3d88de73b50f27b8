//! Log sinks - render and actuator output via tracing

use std::collections::BTreeMap;

use contracts::{ActuatorId, ActuatorSink, ContractError, DisplayKey, Frame, RenderSink};
use tracing::{debug, info, instrument};

/// Render sink that logs frame summaries for debugging
pub struct LogRenderSink {
    name: String,
    shown: BTreeMap<DisplayKey, u64>,
}

impl LogRenderSink {
    /// Create a new LogRenderSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shown: BTreeMap::new(),
        }
    }

    /// Frames shown per display
    pub fn shown(&self) -> &BTreeMap<DisplayKey, u64> {
        &self.shown
    }
}

impl RenderSink for LogRenderSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn show(&mut self, key: &DisplayKey, frame: &Frame) -> Result<(), ContractError> {
        let count = self.shown.entry(*key).or_insert(0);
        *count += 1;
        debug!(
            sink = %self.name,
            display = %key,
            seq = frame.seq,
            width = frame.width,
            height = frame.height,
            "frame shown"
        );
        if *count == 1 {
            info!(sink = %self.name, display = %key, "display opened");
        }
        Ok(())
    }

    #[instrument(name = "log_render_release", skip(self))]
    fn release(&mut self) -> Result<(), ContractError> {
        for (key, count) in &self.shown {
            info!(sink = %self.name, display = %key, frames = count, "display closed");
        }
        self.shown.clear();
        Ok(())
    }
}

/// Actuator sink that only logs commands
pub struct LogActuator {
    name: String,
    pushes: u64,
}

impl LogActuator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pushes: 0,
        }
    }

    pub fn pushes(&self) -> u64 {
        self.pushes
    }
}

impl ActuatorSink for LogActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn push(&mut self, id: ActuatorId) -> Result<(), ContractError> {
        self.pushes += 1;
        info!(sink = %self.name, actuator = id, "PUSH");
        Ok(())
    }

    #[instrument(name = "log_actuator_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, pushes = self.pushes, "STOP");
        Ok(())
    }
}
