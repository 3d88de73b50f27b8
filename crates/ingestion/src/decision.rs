//! Decision stage - turns a detected region into actuate / pass
//!
//! Source-specific: defect inference with a probability threshold, or color
//! classification against a target label.

use contracts::{ClassScores, ColorClassifier, ContractError, DefectInference, Region};
use tracing::debug;

/// Outcome of the decision stage for one detected region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Enqueue one actuator command
    Actuate,
    /// Let the item pass
    Pass,
}

impl Decision {
    fn from_bool(actuate: bool) -> Self {
        if actuate {
            Self::Actuate
        } else {
            Self::Pass
        }
    }
}

/// Classification collaborator plus its decision rule
pub enum DecisionStage {
    /// Actuate when P(`defect_class`) > `threshold`
    Defect {
        inference: Box<dyn DefectInference>,
        defect_class: String,
        threshold: f32,
    },

    /// Actuate when the dominant color equals `target`
    Color {
        classifier: Box<dyn ColorClassifier>,
        target: String,
    },
}

impl DecisionStage {
    pub fn defect(
        inference: Box<dyn DefectInference>,
        defect_class: impl Into<String>,
        threshold: f32,
    ) -> Self {
        Self::Defect {
            inference,
            defect_class: defect_class.into(),
            threshold,
        }
    }

    pub fn color(classifier: Box<dyn ColorClassifier>, target: impl Into<String>) -> Self {
        Self::Color {
            classifier,
            target: target.into(),
        }
    }

    /// Make the collaborator ready (called once before the worker loop)
    pub fn prepare(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Defect { inference, .. } => inference.prepare(),
            Self::Color { classifier, .. } => classifier.prepare(),
        }
    }

    /// Classify `region` and apply the rule
    ///
    /// # Errors
    /// Collaborator failures, or a model whose output lacks the defect class.
    pub fn decide(&mut self, region: &Region) -> Result<Decision, ContractError> {
        match self {
            Self::Defect {
                inference,
                defect_class,
                threshold,
            } => {
                let scores = inference.infer(region)?;
                debug!(scores = ?scores, "inference result");
                defect_rule_met(&scores, defect_class, *threshold)
                    .map(Decision::from_bool)
                    .ok_or_else(|| {
                        ContractError::detection(format!(
                            "model output has no class '{defect_class}'"
                        ))
                    })
            }
            Self::Color { classifier, target } => {
                let color = classifier.classify(region)?;
                debug!(
                    label = %color.label,
                    ratio = format!("{:.2}%", color.confidence * 100.0),
                    "color result"
                );
                Ok(Decision::from_bool(color.label == *target))
            }
        }
    }

    /// Short rule description for logs
    pub fn describe(&self) -> String {
        match self {
            Self::Defect {
                defect_class,
                threshold,
                ..
            } => format!("P({defect_class}) > {threshold}"),
            Self::Color { target, .. } => format!("color == {target}"),
        }
    }
}

impl std::fmt::Debug for DecisionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DecisionStage").field(&self.describe()).finish()
    }
}

/// `Some(p > threshold)` for the defect class, `None` if the class is absent
pub fn defect_rule_met(scores: &ClassScores, defect_class: &str, threshold: f32) -> Option<bool> {
    scores.get(defect_class).map(|p| *p > threshold)
}
