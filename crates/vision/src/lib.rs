//! # Vision
//!
//! Reference collaborators for the sensing pipelines.
//!
//! - Frame sources: image directory playback, synthetic belt generator
//! - Region detection: frame differencing
//! - Classification: linear softmax defect model, hue palette color matcher
//! - `factory`: builds a ready-to-spawn `SensorWorker` from a `SourceConfig`

pub mod color;
pub mod detector;
pub mod directory;
pub mod error;
pub mod factory;
pub mod inference;
pub mod synthetic;

pub use color::{rgb_to_hsv, HueColorClassifier};
pub use detector::FrameDiffDetector;
pub use directory::DirectoryFrameSource;
pub use error::{Result, VisionError};
pub use factory::{build_decision, build_detector, build_frame_source, build_worker};
pub use inference::LinearInference;
pub use synthetic::SyntheticFrameSource;
