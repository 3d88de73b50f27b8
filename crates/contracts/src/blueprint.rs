//! LineBlueprint - Config Loader output
//!
//! Describes the complete sorting line: timing, shutdown policy, the sensing
//! sources with their detection / decision stages, and the output sinks.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{ActuatorId, SourceId};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete line configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Line-wide timing and shutdown settings
    #[serde(default)]
    pub line: LineConfig,

    /// Sensing sources (one worker each)
    pub sources: Vec<SourceConfig>,

    /// Live display output
    #[serde(default)]
    pub render: RenderConfig,

    /// Actuator output
    #[serde(default)]
    pub actuator: ActuatorConfig,
}

impl LineBlueprint {
    /// Look up a source by id
    pub fn source(&self, id: SourceId) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// All configured source ids, in declaration order
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.id).collect()
    }
}

/// Line-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Line name (logging only)
    #[serde(default = "default_line_name")]
    pub name: String,

    /// Delay before each worker iteration (ms); approximates the camera frame rate
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Dispatcher dequeue timeout (ms); bounds abort-polling latency
    #[serde(default = "default_dequeue_timeout_ms")]
    pub dequeue_timeout_ms: u64,

    /// When a finished source stops the line
    #[serde(default)]
    pub shutdown_policy: ShutdownPolicy,
}

impl LineConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            name: default_line_name(),
            pacing_ms: default_pacing_ms(),
            dequeue_timeout_ms: default_dequeue_timeout_ms(),
            shutdown_policy: ShutdownPolicy::default(),
        }
    }
}

fn default_line_name() -> String {
    "sorting-line".to_string()
}

fn default_pacing_ms() -> u64 {
    30
}

fn default_dequeue_timeout_ms() -> u64 {
    1000
}

/// Global shutdown policy
///
/// `FirstFinished` mirrors the line's historical behavior: the first source to
/// run out of input stops everything, even if the other source still has
/// frames. `AllFinished` waits until every configured source has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    #[default]
    FirstFinished,
    AllFinished,
}

/// One sensing source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source label (unique, non-zero)
    pub id: SourceId,

    /// Actuator moved when this source's decision fires
    pub actuator_id: ActuatorId,

    /// Frame input
    pub input: InputConfig,

    /// Region-of-interest detector
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Classification stage and decision rule
    pub decision: DecisionConfig,
}

/// Frame input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputConfig {
    /// Image files in a directory, played in file-name order
    Directory { path: PathBuf },

    /// Generated frames: a colored item crossing a gray belt
    Synthetic {
        /// Frames before exhaustion
        frames: u64,
        #[serde(default = "default_synthetic_width")]
        width: u32,
        #[serde(default = "default_synthetic_height")]
        height: u32,
        /// Item color (RGB)
        #[serde(default = "default_item_color")]
        item_color: [u8; 3],
        /// Frames between two items entering the belt
        #[serde(default = "default_item_every")]
        item_every: u64,
    },
}

fn default_synthetic_width() -> u32 {
    160
}

fn default_synthetic_height() -> u32 {
    120
}

fn default_item_color() -> [u8; 3] {
    [30, 60, 200]
}

fn default_item_every() -> u64 {
    12
}

/// Region-of-interest detector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorConfig {
    /// Motion by difference against the previous frame
    FrameDiff {
        /// Per-pixel luma difference counted as motion
        #[serde(default = "default_pixel_threshold")]
        pixel_threshold: u8,
        /// Minimum changed pixels for a detection
        #[serde(default = "default_min_area")]
        min_area: u32,
        /// Pixels added around the changed bounding box
        #[serde(default = "default_padding")]
        padding: u32,
    },
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::FrameDiff {
            pixel_threshold: default_pixel_threshold(),
            min_area: default_min_area(),
            padding: default_padding(),
        }
    }
}

fn default_pixel_threshold() -> u8 {
    25
}

fn default_min_area() -> u32 {
    64
}

fn default_padding() -> u32 {
    4
}

/// Classification stage + decision rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionConfig {
    /// Model inference; actuate when P(defect_class) > threshold
    DefectProbability {
        defect_class: String,
        threshold: f32,
        model: ModelConfig,
    },

    /// Color classification; actuate when the dominant color equals `target`
    TargetColor {
        target: String,
        #[serde(default = "default_palette")]
        palette: Vec<PaletteEntry>,
        /// Minimum HSV saturation (0-1) for a pixel to count
        #[serde(default = "default_min_saturation")]
        min_saturation: f32,
    },
}

/// Linear softmax model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ModelConfig {
    /// JSON model file: `{ "classes": [ { "name", "weights", "bias" } ] }`
    File { path: PathBuf },

    /// Classes given inline
    Inline { classes: Vec<LinearClass> },
}

/// One output class of a linear model over normalized mean RGB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClass {
    pub name: String,
    pub weights: [f32; 3],
    #[serde(default)]
    pub bias: f32,
}

/// Named hue range, degrees. `hue_min > hue_max` wraps through 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub label: String,
    pub hue_min: f32,
    pub hue_max: f32,
}

impl PaletteEntry {
    pub fn new(label: impl Into<String>, hue_min: f32, hue_max: f32) -> Self {
        Self {
            label: label.into(),
            hue_min,
            hue_max,
        }
    }

    /// Whether `hue` (degrees) falls in this range
    pub fn contains(&self, hue: f32) -> bool {
        if self.hue_min <= self.hue_max {
            hue >= self.hue_min && hue <= self.hue_max
        } else {
            hue >= self.hue_min || hue <= self.hue_max
        }
    }
}

/// Default color palette
pub fn default_palette() -> Vec<PaletteEntry> {
    vec![
        PaletteEntry::new("red", 340.0, 20.0),
        PaletteEntry::new("yellow", 40.0, 70.0),
        PaletteEntry::new("green", 80.0, 160.0),
        PaletteEntry::new("blue", 190.0, 260.0),
    ]
}

fn default_min_saturation() -> f32 {
    0.35
}

/// Live display output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderConfig {
    /// Log frame summaries via tracing
    #[default]
    Log,

    /// Keep the latest frame of every display as `<dir>/<display>.png`
    Snapshot { dir: PathBuf },
}

/// Actuator output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorConfig {
    /// Log actuator commands via tracing
    #[default]
    Log,

    /// Line protocol written to a device path (serial port, FIFO, file)
    Device { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_wraps_through_zero() {
        let red = PaletteEntry::new("red", 340.0, 20.0);
        assert!(red.contains(350.0));
        assert!(red.contains(5.0));
        assert!(!red.contains(180.0));

        let blue = PaletteEntry::new("blue", 190.0, 260.0);
        assert!(blue.contains(230.0));
        assert!(!blue.contains(300.0));
    }

    #[test]
    fn test_line_defaults() {
        let line = LineConfig::default();
        assert_eq!(line.pacing(), Duration::from_millis(30));
        assert_eq!(line.dequeue_timeout(), Duration::from_secs(1));
        assert_eq!(line.shutdown_policy, ShutdownPolicy::FirstFinished);
    }

    #[test]
    fn test_tagged_enums_from_json() {
        let json = r#"{
            "sources": [{
                "id": 2,
                "actuator_id": 2,
                "input": { "kind": "synthetic", "frames": 10 },
                "decision": { "kind": "target_color", "target": "blue" }
            }],
            "actuator": { "kind": "device", "path": "/dev/ttyACM0" }
        }"#;
        let bp: LineBlueprint = serde_json::from_str(json).unwrap();
        assert_eq!(bp.source_ids(), vec![SourceId::new(2)]);
        assert!(matches!(bp.render, RenderConfig::Log));
        assert!(matches!(bp.actuator, ActuatorConfig::Device { .. }));

        let source = bp.source(SourceId::new(2)).unwrap();
        assert!(matches!(source.detector, DetectorConfig::FrameDiff { .. }));
        match &source.decision {
            DecisionConfig::TargetColor { palette, .. } => assert_eq!(palette.len(), 4),
            other => panic!("unexpected decision: {other:?}"),
        }
    }
}
