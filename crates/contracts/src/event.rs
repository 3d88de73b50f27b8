//! Event - the only message type crossing the event queue
//!
//! A closed set of variants, so dispatch is an exhaustive `match`.

use std::fmt;

use crate::{ActuatorId, Frame, SourceId};

/// Event produced by a sensor worker and consumed by the dispatcher
#[derive(Debug, Clone)]
pub enum Event {
    /// A newly captured frame, for display only
    RawFrame { source: SourceId, frame: Frame },

    /// A frame containing a detected region of interest, for display only
    DetectedFrame { source: SourceId, frame: Frame },

    /// Decision to move a physical actuator
    ActuatorCommand { actuator: ActuatorId },

    /// The source's input is exhausted
    SourceFinished { source: SourceId },
}

impl Event {
    pub fn raw_frame(source: SourceId, frame: Frame) -> Self {
        Self::RawFrame { source, frame }
    }

    pub fn detected_frame(source: SourceId, frame: Frame) -> Self {
        Self::DetectedFrame { source, frame }
    }

    pub fn actuator_command(actuator: ActuatorId) -> Self {
        Self::ActuatorCommand { actuator }
    }

    pub fn source_finished(source: SourceId) -> Self {
        Self::SourceFinished { source }
    }

    /// Payload-free kind tag
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RawFrame { .. } => EventKind::RawFrame,
            Self::DetectedFrame { .. } => EventKind::DetectedFrame,
            Self::ActuatorCommand { .. } => EventKind::ActuatorCommand,
            Self::SourceFinished { .. } => EventKind::SourceFinished,
        }
    }

    /// Source tag, if the variant carries one
    pub fn source(&self) -> Option<SourceId> {
        match self {
            Self::RawFrame { source, .. }
            | Self::DetectedFrame { source, .. }
            | Self::SourceFinished { source } => Some(*source),
            Self::ActuatorCommand { .. } => None,
        }
    }
}

/// Kind of an [`Event`], used for metric labels and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RawFrame,
    DetectedFrame,
    ActuatorCommand,
    SourceFinished,
}

impl EventKind {
    /// All kinds, in declaration order
    pub const ALL: [EventKind; 4] = [
        EventKind::RawFrame,
        EventKind::DetectedFrame,
        EventKind::ActuatorCommand,
        EventKind::SourceFinished,
    ];

    /// snake_case label
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RawFrame => "raw_frame",
            Self::DetectedFrame => "detected_frame",
            Self::ActuatorCommand => "actuator_command",
            Self::SourceFinished => "source_finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
