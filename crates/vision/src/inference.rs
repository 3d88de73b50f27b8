//! LinearInference - softmax over a linear model of the region's mean color
//!
//! Model file format (JSON):
//!
//! ```json
//! { "classes": [ { "name": "x", "weights": [2.0, -1.0, -1.0], "bias": 0.0 } ] }
//! ```

use std::path::{Path, PathBuf};

use contracts::{ClassScores, ContractError, DefectInference, LinearClass, ModelConfig, Region};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, VisionError};

#[derive(Debug, Deserialize)]
struct ModelFile {
    classes: Vec<LinearClass>,
}

#[derive(Debug, Clone)]
enum ModelOrigin {
    File(PathBuf),
    Inline,
}

/// Linear softmax defect classifier
#[derive(Debug, Clone)]
pub struct LinearInference {
    origin: ModelOrigin,
    classes: Vec<LinearClass>,
}

impl LinearInference {
    /// Model with classes given directly
    pub fn from_classes(classes: Vec<LinearClass>) -> Result<Self> {
        check_classes(&classes)?;
        Ok(Self {
            origin: ModelOrigin::Inline,
            classes,
        })
    }

    /// Model loaded from `path` in `prepare()`
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: ModelOrigin::File(path.into()),
            classes: Vec::new(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        match config {
            ModelConfig::File { path } => Ok(Self::from_file(path)),
            ModelConfig::Inline { classes } => Self::from_classes(classes.clone()),
        }
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.name.as_str())
    }

    fn load(path: &Path) -> Result<Vec<LinearClass>> {
        let text =
            std::fs::read_to_string(path).map_err(|e| VisionError::model_load(path, e.to_string()))?;
        let model: ModelFile =
            serde_json::from_str(&text).map_err(|e| VisionError::model_load(path, e.to_string()))?;
        check_classes(&model.classes)?;
        Ok(model.classes)
    }
}

fn check_classes(classes: &[LinearClass]) -> Result<()> {
    if classes.is_empty() {
        return Err(VisionError::invalid_model("model has no classes"));
    }
    for (i, class) in classes.iter().enumerate() {
        if class.name.is_empty() {
            return Err(VisionError::invalid_model(format!("class {i} has no name")));
        }
        if classes[..i].iter().any(|c| c.name == class.name) {
            return Err(VisionError::invalid_model(format!(
                "duplicate class '{}'",
                class.name
            )));
        }
    }
    Ok(())
}

/// Mean RGB of the region, normalized to 0-1
fn mean_rgb(region: &Region) -> Option<[f32; 3]> {
    let frame = &region.frame;
    let count = frame.pixel_count();
    if count == 0 {
        return None;
    }

    let mut sum = [0u64; 3];
    for y in 0..frame.height {
        for x in 0..frame.width {
            if let Some(px) = frame.rgb_at(x, y) {
                for (acc, v) in sum.iter_mut().zip(px) {
                    *acc += v as u64;
                }
            }
        }
    }
    Some(sum.map(|s| s as f32 / count as f32 / 255.0))
}

/// Numerically stable softmax
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl DefectInference for LinearInference {
    fn prepare(&mut self) -> std::result::Result<(), ContractError> {
        if let ModelOrigin::File(path) = &self.origin {
            self.classes = Self::load(path).map_err(|e| e.into_unavailable("linear model"))?;
            info!(path = %path.display(), classes = self.classes.len(), "model loaded");
        }
        Ok(())
    }

    fn infer(&mut self, region: &Region) -> std::result::Result<ClassScores, ContractError> {
        if self.classes.is_empty() {
            return Err(ContractError::detection("model not loaded"));
        }
        let rgb = mean_rgb(region).ok_or_else(|| ContractError::detection("empty region"))?;

        let logits: Vec<f32> = self
            .classes
            .iter()
            .map(|c| c.weights.iter().zip(rgb).map(|(w, v)| w * v).sum::<f32>() + c.bias)
            .collect();

        let scores: ClassScores = self
            .classes
            .iter()
            .zip(softmax(&logits))
            .map(|(c, p)| (c.name.clone(), p))
            .collect();
        debug!(seq = region.frame.seq, ?scores, "inference");
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Frame;

    fn red_blue_model() -> Vec<LinearClass> {
        vec![
            LinearClass {
                name: "x".to_string(),
                weights: [4.0, 0.0, -4.0],
                bias: 0.0,
            },
            LinearClass {
                name: "circle".to_string(),
                weights: [-4.0, 0.0, 4.0],
                bias: 0.0,
            },
        ]
    }

    fn region(rgb: [u8; 3]) -> Region {
        Region::whole(Frame::filled_rgb(0, 4, 4, rgb))
    }

    #[test]
    fn test_scores_sum_to_one_and_follow_color() {
        let mut model = LinearInference::from_classes(red_blue_model()).unwrap();
        model.prepare().unwrap();

        let scores = model.infer(&region([255, 0, 0])).unwrap();
        let total: f32 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(scores["x"] > 0.99);

        let scores = model.infer(&region([0, 0, 255])).unwrap();
        assert!(scores["circle"] > 0.99);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{ "classes": [
                { "name": "x", "weights": [1.0, 0.0, 0.0] },
                { "name": "ok", "weights": [0.0, 0.0, 0.0], "bias": 0.5 }
            ] }"#,
        )
        .unwrap();

        let mut model = LinearInference::from_file(&path);
        model.prepare().unwrap();
        assert_eq!(model.class_names().collect::<Vec<_>>(), vec!["x", "ok"]);
        assert_eq!(model.infer(&region([0, 0, 0])).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_model_file_is_unavailable() {
        let mut model = LinearInference::from_file("/nonexistent/model.json");
        let err = model.prepare().unwrap_err();
        assert!(matches!(err, ContractError::Unavailable { .. }));
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        let mut classes = red_blue_model();
        classes[1].name = "x".to_string();
        assert!(matches!(
            LinearInference::from_classes(classes),
            Err(VisionError::InvalidModel { .. })
        ));
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-6);
    }
}
