//! SourceId - identifies one of the sensing pipelines
//!
//! Sources are labeled with small integers (1 and 2 on the reference line).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical actuator identifier
pub type ActuatorId = u32;

/// Sensing pipeline identifier.
///
/// Copyable and hashable so it can tag every event without allocation.
///
/// # Examples
/// ```
/// use contracts::SourceId;
///
/// let id = SourceId::new(1);
/// assert_eq!(id.get(), 1);
/// assert_eq!(id.to_string(), "cam1");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(u8);

impl SourceId {
    /// Create a new SourceId
    #[inline]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw numeric label
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Window-style title prefix ("Cam1")
    pub fn title(self) -> String {
        format!("Cam{}", self.0)
    }
}

impl From<u8> for SourceId {
    #[inline]
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cam{}", self.0)
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}
