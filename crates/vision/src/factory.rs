//! Worker factory
//!
//! Turns a `SourceConfig` into a `SensorWorker` with concrete collaborators.
//! Nothing is opened here; availability is checked by the worker's setup.

use std::time::Duration;

use contracts::{
    DecisionConfig, DetectorConfig, FrameSource, InputConfig, RegionDetector, SourceConfig,
};
use ingestion::{DecisionStage, SensorWorker, WorkerConfig};
use tracing::{info, instrument};

use crate::color::HueColorClassifier;
use crate::detector::FrameDiffDetector;
use crate::directory::DirectoryFrameSource;
use crate::error::Result;
use crate::inference::LinearInference;
use crate::synthetic::SyntheticFrameSource;

pub fn build_frame_source(input: &InputConfig) -> Box<dyn FrameSource> {
    match input {
        InputConfig::Directory { path } => Box::new(DirectoryFrameSource::new(path)),
        InputConfig::Synthetic {
            frames,
            width,
            height,
            item_color,
            item_every,
        } => Box::new(SyntheticFrameSource::new(
            *frames,
            *width,
            *height,
            *item_color,
            *item_every,
        )),
    }
}

pub fn build_detector(detector: &DetectorConfig) -> Box<dyn RegionDetector> {
    match detector {
        DetectorConfig::FrameDiff {
            pixel_threshold,
            min_area,
            padding,
        } => Box::new(FrameDiffDetector::new(*pixel_threshold, *min_area, *padding)),
    }
}

/// # Errors
/// Inline models with no or duplicate classes are rejected.
pub fn build_decision(decision: &DecisionConfig) -> Result<DecisionStage> {
    Ok(match decision {
        DecisionConfig::DefectProbability {
            defect_class,
            threshold,
            model,
        } => DecisionStage::defect(
            Box::new(LinearInference::from_config(model)?),
            defect_class.clone(),
            *threshold,
        ),
        DecisionConfig::TargetColor {
            target,
            palette,
            min_saturation,
        } => DecisionStage::color(
            Box::new(HueColorClassifier::new(palette.clone(), *min_saturation)),
            target.clone(),
        ),
    })
}

/// Build the worker for one configured source
#[instrument(name = "vision_build_worker", skip(config), fields(source = %config.id))]
pub fn build_worker(config: &SourceConfig, pacing: Duration) -> Result<SensorWorker> {
    let decision = build_decision(&config.decision)?;
    let worker = SensorWorker::new(
        WorkerConfig::new(config.id, config.actuator_id).with_pacing(pacing),
        build_frame_source(&config.input),
        build_detector(&config.detector),
        decision,
    );

    info!(
        actuator = config.actuator_id,
        pacing_ms = pacing.as_millis() as u64,
        "sensor worker built"
    );
    Ok(worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Event, EventKind, LinearClass, ModelConfig, SourceId};
    use event_queue::{EventQueue, StopSignal};

    /// Run a worker to completion on this thread and collect its events
    fn drain(worker: SensorWorker) -> Vec<Event> {
        let queue = EventQueue::new();
        worker.run_blocking(&queue, &StopSignal::new()).unwrap();
        std::iter::from_fn(|| queue.try_dequeue()).collect()
    }

    fn synthetic(frames: u64, item_color: [u8; 3]) -> InputConfig {
        InputConfig::Synthetic {
            frames,
            width: 48,
            height: 24,
            item_color,
            item_every: 4,
        }
    }

    fn color_source(item_color: [u8; 3]) -> SourceConfig {
        SourceConfig {
            id: SourceId::new(2),
            actuator_id: 2,
            input: synthetic(4, item_color),
            detector: DetectorConfig::FrameDiff {
                pixel_threshold: 25,
                min_area: 8,
                padding: 0,
            },
            decision: DecisionConfig::TargetColor {
                target: "blue".to_string(),
                palette: contracts::default_palette(),
                min_saturation: 0.35,
            },
        }
    }

    fn commands(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|e| e.kind() == EventKind::ActuatorCommand)
            .count()
    }

    #[test]
    fn test_blue_items_are_pushed() {
        let worker = build_worker(&color_source([30, 60, 200]), Duration::ZERO).unwrap();
        let events = drain(worker);

        // frames 1..3 move; frame 0 has no reference
        assert_eq!(commands(&events), 3);
        assert_eq!(events.last().map(Event::kind), Some(EventKind::SourceFinished));
    }

    #[test]
    fn test_red_items_pass() {
        let worker = build_worker(&color_source([220, 20, 20]), Duration::ZERO).unwrap();
        let events = drain(worker);
        assert_eq!(commands(&events), 0);
        assert!(events.iter().any(|e| e.kind() == EventKind::DetectedFrame));
    }

    #[test]
    fn test_inline_defect_model() {
        let config = SourceConfig {
            id: SourceId::new(1),
            actuator_id: 1,
            input: synthetic(3, [220, 20, 20]),
            detector: DetectorConfig::FrameDiff {
                pixel_threshold: 25,
                min_area: 8,
                padding: 0,
            },
            decision: DecisionConfig::DefectProbability {
                defect_class: "x".to_string(),
                threshold: 0.5,
                model: ModelConfig::Inline {
                    classes: vec![
                        LinearClass {
                            name: "x".to_string(),
                            weights: [6.0, -3.0, -3.0],
                            bias: 0.0,
                        },
                        LinearClass {
                            name: "circle".to_string(),
                            weights: [0.0, 0.0, 0.0],
                            bias: 0.0,
                        },
                    ],
                },
            },
        };

        let events = drain(build_worker(&config, Duration::ZERO).unwrap());
        assert_eq!(commands(&events), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, Event::ActuatorCommand { actuator: 1 })
                || e.source() == Some(SourceId::new(1))));
    }

    #[test]
    fn test_empty_inline_model_rejected() {
        let decision = DecisionConfig::DefectProbability {
            defect_class: "x".to_string(),
            threshold: 0.5,
            model: ModelConfig::Inline { classes: vec![] },
        };
        assert!(build_decision(&decision).is_err());
    }

    #[test]
    fn test_missing_directory_fails_setup() {
        let mut config = color_source([30, 60, 200]);
        config.input = InputConfig::Directory {
            path: "/nonexistent/frames".into(),
        };
        let worker = build_worker(&config, Duration::ZERO).unwrap();
        let queue = EventQueue::new();
        let err = worker.run_blocking(&queue, &StopSignal::new()).unwrap_err();
        assert!(matches!(err, ingestion::IngestionError::Setup { stage: "frame source", .. }));
        assert!(queue.is_empty());
    }
}
