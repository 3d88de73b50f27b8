//! DeviceActuator - line protocol to a device path
//!
//! One line per command, `PUSH <id>`; `STOP` on close. The path can be a
//! serial port, a FIFO read by the controller, or a plain file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ActuatorId, ActuatorSink, ContractError};
use tracing::{debug, info, instrument, warn};

pub struct DeviceActuator {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl DeviceActuator {
    /// Open the device for writing
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "actuator device opened");

        Ok(Self {
            name: name.into(),
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn send(&mut self, line: &str) -> Result<(), ContractError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ContractError::actuator(&self.name, "device closed"))?;
        writeln!(writer, "{line}")
            .and_then(|_| writer.flush())
            .map_err(|e| ContractError::actuator(&self.name, e.to_string()))
    }
}

impl ActuatorSink for DeviceActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn push(&mut self, id: ActuatorId) -> Result<(), ContractError> {
        self.send(&format!("PUSH {id}"))?;
        debug!(sink = %self.name, actuator = id, "command sent");
        Ok(())
    }

    #[instrument(name = "device_actuator_close", skip(self), fields(sink = %self.name))]
    fn close(&mut self) -> Result<(), ContractError> {
        if self.writer.is_none() {
            warn!("device already closed");
            return Ok(());
        }
        let result = self.send("STOP");
        self.writer = None;
        info!(path = %self.path.display(), "actuator device closed");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_line_protocol() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("device");
        let mut sink = DeviceActuator::open("device", &path).unwrap();

        sink.push(1).unwrap();
        sink.push(2).unwrap();
        sink.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "PUSH 1\nPUSH 2\nSTOP\n");
    }

    #[test]
    fn test_push_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut sink = DeviceActuator::open("device", dir.path().join("device")).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();

        let err = sink.push(1).unwrap_err();
        assert!(matches!(err, ContractError::Actuator { .. }));
    }

    #[test]
    fn test_missing_parent_dir_fails_open() {
        let dir = tempdir().unwrap();
        assert!(DeviceActuator::open("device", dir.path().join("no/such/tty")).is_err());
    }
}
