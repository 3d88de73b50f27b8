//! External collaborator traits used by sensor workers
//!
//! Frame acquisition, region detection and classification are opaque
//! services. Workers own their collaborators exclusively, so every method
//! takes `&mut self` and the traits only require `Send`.

use std::collections::BTreeMap;

use crate::{ContractError, Frame, Region};

/// Per-class probabilities returned by an inference collaborator
pub type ClassScores = BTreeMap<String, f32>;

/// Frame acquisition
///
/// # Example
///
/// ```ignore
/// let mut source: Box<dyn FrameSource> = open_camera()?;
/// source.open()?;
/// while let Some(frame) = source.acquire()? {
///     // ...
/// }
/// source.release();
/// ```
pub trait FrameSource: Send {
    /// Human-readable name (path, device, ...)
    fn name(&self) -> &str;

    /// Make the source ready. Called once, before the worker loop starts.
    ///
    /// # Errors
    /// Returns an error if the source is unavailable; the worker then never starts.
    fn open(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    /// Next frame, or `None` once the input is exhausted
    fn acquire(&mut self) -> Result<Option<Frame>, ContractError>;

    /// Release the underlying handle. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Motion / region-of-interest detection
pub trait RegionDetector: Send {
    /// Load presets, allocate state. Called once before the loop.
    fn prepare(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    /// Region of interest in `frame`, if any
    fn detect(&mut self, frame: &Frame) -> Result<Option<Region>, ContractError>;
}

/// Model inference over a detected region
pub trait DefectInference: Send {
    fn prepare(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    /// Class name -> probability
    fn infer(&mut self, region: &Region) -> Result<ClassScores, ContractError>;
}

/// Dominant color of a detected region
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMatch {
    /// Palette label (e.g. "blue")
    pub label: String,

    /// Fraction of the region's pixels matching the label (0-1)
    pub confidence: f32,
}

/// Color classification over a detected region
pub trait ColorClassifier: Send {
    fn prepare(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    fn classify(&mut self, region: &Region) -> Result<ColorMatch, ContractError>;
}
