//! One-line descriptions of configuration parts, shared by the commands.

use contracts::{
    ActuatorConfig, DecisionConfig, DetectorConfig, InputConfig, ModelConfig, RenderConfig,
    ShutdownPolicy,
};

pub fn input(input: &InputConfig) -> String {
    match input {
        InputConfig::Directory { path } => format!("directory {}", path.display()),
        InputConfig::Synthetic {
            frames,
            width,
            height,
            item_every,
            ..
        } => format!("synthetic {frames} frames {width}x{height}, item every {item_every}"),
    }
}

pub fn detector(detector: &DetectorConfig) -> String {
    match detector {
        DetectorConfig::FrameDiff {
            pixel_threshold,
            min_area,
            padding,
        } => format!("frame diff (threshold {pixel_threshold}, min area {min_area}, padding {padding})"),
    }
}

pub fn decision(decision: &DecisionConfig) -> String {
    match decision {
        DecisionConfig::DefectProbability {
            defect_class,
            threshold,
            model,
        } => {
            let model = match model {
                ModelConfig::File { path } => format!("model {}", path.display()),
                ModelConfig::Inline { classes } => format!("inline model, {} classes", classes.len()),
            };
            format!("P({defect_class}) > {threshold}, {model}")
        }
        DecisionConfig::TargetColor {
            target, palette, ..
        } => format!("color == {target} ({} palette entries)", palette.len()),
    }
}

pub fn render(render: &RenderConfig) -> String {
    match render {
        RenderConfig::Log => "log".to_string(),
        RenderConfig::Snapshot { dir } => format!("snapshot {}", dir.display()),
    }
}

pub fn actuator(actuator: &ActuatorConfig) -> String {
    match actuator {
        ActuatorConfig::Log => "log".to_string(),
        ActuatorConfig::Device { path } => format!("device {}", path.display()),
    }
}

pub fn policy(policy: ShutdownPolicy) -> &'static str {
    match policy {
        ShutdownPolicy::FirstFinished => "first_finished",
        ShutdownPolicy::AllFinished => "all_finished",
    }
}
