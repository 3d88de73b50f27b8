//! 配置校验模块
//!
//! 校验规则：
//! - 至少一个 source，source id 唯一且非 0
//! - actuator_id 唯一
//! - pacing_ms <= 10000，dequeue_timeout_ms > 0
//! - 输入 / 检测器 / 决策规则参数合法
//! - 输出 sink 必填字段齐全

use std::collections::HashSet;

use contracts::{
    ActuatorConfig, ContractError, DecisionConfig, DetectorConfig, InputConfig, LineBlueprint,
    ModelConfig, RenderConfig, SourceConfig,
};

/// pacing 上限 (ms)
pub const MAX_PACING_MS: u64 = 10_000;

/// 校验 LineBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &LineBlueprint) -> Result<(), ContractError> {
    validate_line(blueprint)?;
    validate_source_ids(blueprint)?;
    validate_actuator_ids(blueprint)?;
    for source in &blueprint.sources {
        validate_input(source)?;
        validate_detector(source)?;
        validate_decision(source)?;
    }
    validate_outputs(blueprint)?;
    Ok(())
}

/// 校验产线时序参数
fn validate_line(blueprint: &LineBlueprint) -> Result<(), ContractError> {
    let line = &blueprint.line;
    if line.pacing_ms > MAX_PACING_MS {
        return Err(ContractError::config_validation(
            "line.pacing_ms",
            format!("pacing_ms must be <= {MAX_PACING_MS}, got {}", line.pacing_ms),
        ));
    }
    if line.dequeue_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "line.dequeue_timeout_ms",
            "dequeue_timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验 source id 唯一性
fn validate_source_ids(blueprint: &LineBlueprint) -> Result<(), ContractError> {
    if blueprint.sources.is_empty() {
        return Err(ContractError::config_validation(
            "sources",
            "at least one source is required",
        ));
    }

    let mut seen = HashSet::new();
    for source in &blueprint.sources {
        if source.id.get() == 0 {
            return Err(ContractError::config_validation(
                "sources[id=0]",
                "source id must be non-zero",
            ));
        }
        if !seen.insert(source.id) {
            return Err(ContractError::config_validation(
                format!("sources[id={}]", source.id.get()),
                "duplicate source id",
            ));
        }
    }
    Ok(())
}

/// 校验 actuator_id 唯一性
fn validate_actuator_ids(blueprint: &LineBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for source in &blueprint.sources {
        if !seen.insert(source.actuator_id) {
            return Err(ContractError::config_validation(
                format!("sources[{}].actuator_id", source.id),
                format!("duplicate actuator_id {}", source.actuator_id),
            ));
        }
    }
    Ok(())
}

fn validate_input(source: &SourceConfig) -> Result<(), ContractError> {
    let field = |name: &str| format!("sources[{}].input.{name}", source.id);
    match &source.input {
        InputConfig::Directory { path } => {
            if path.as_os_str().is_empty() {
                return Err(ContractError::config_validation(
                    field("path"),
                    "directory path cannot be empty",
                ));
            }
        }
        InputConfig::Synthetic {
            frames,
            width,
            height,
            item_every,
            ..
        } => {
            if *frames == 0 {
                return Err(ContractError::config_validation(
                    field("frames"),
                    "frames must be > 0",
                ));
            }
            if *width < 3 || *height < 3 {
                return Err(ContractError::config_validation(
                    field("width / height"),
                    format!("frame must be at least 3x3, got {width}x{height}"),
                ));
            }
            if *item_every == 0 {
                return Err(ContractError::config_validation(
                    field("item_every"),
                    "item_every must be > 0",
                ));
            }
        }
    }
    Ok(())
}

fn validate_detector(source: &SourceConfig) -> Result<(), ContractError> {
    match &source.detector {
        DetectorConfig::FrameDiff { min_area, .. } => {
            if *min_area == 0 {
                return Err(ContractError::config_validation(
                    format!("sources[{}].detector.min_area", source.id),
                    "min_area must be > 0",
                ));
            }
        }
    }
    Ok(())
}

/// 校验决策规则
fn validate_decision(source: &SourceConfig) -> Result<(), ContractError> {
    let field = |name: &str| format!("sources[{}].decision.{name}", source.id);
    match &source.decision {
        DecisionConfig::DefectProbability {
            defect_class,
            threshold,
            model,
        } => {
            if defect_class.is_empty() {
                return Err(ContractError::config_validation(
                    field("defect_class"),
                    "defect_class cannot be empty",
                ));
            }
            if !(0.0..=1.0).contains(threshold) {
                return Err(ContractError::config_validation(
                    field("threshold"),
                    format!("threshold must be within [0, 1], got {threshold}"),
                ));
            }
            match model {
                ModelConfig::File { path } if path.as_os_str().is_empty() => {
                    return Err(ContractError::config_validation(
                        field("model.path"),
                        "model path cannot be empty",
                    ));
                }
                ModelConfig::Inline { classes } => {
                    if !classes.iter().any(|c| &c.name == defect_class) {
                        return Err(ContractError::config_validation(
                            field("model.classes"),
                            format!("inline model has no class '{defect_class}'"),
                        ));
                    }
                }
                ModelConfig::File { .. } => {}
            }
        }
        DecisionConfig::TargetColor {
            target,
            palette,
            min_saturation,
        } => {
            if target.is_empty() {
                return Err(ContractError::config_validation(
                    field("target"),
                    "target color cannot be empty",
                ));
            }
            if !palette.iter().any(|e| &e.label == target) {
                return Err(ContractError::config_validation(
                    field("palette"),
                    format!("target '{target}' is not in the palette"),
                ));
            }
            if !(0.0..=1.0).contains(min_saturation) {
                return Err(ContractError::config_validation(
                    field("min_saturation"),
                    format!("min_saturation must be within [0, 1], got {min_saturation}"),
                ));
            }
        }
    }
    Ok(())
}

/// 校验输出 sink 配置
fn validate_outputs(blueprint: &LineBlueprint) -> Result<(), ContractError> {
    if let RenderConfig::Snapshot { dir } = &blueprint.render {
        if dir.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                "render.dir",
                "snapshot dir cannot be empty",
            ));
        }
    }
    if let ActuatorConfig::Device { path } = &blueprint.actuator {
        if path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                "actuator.path",
                "device path cannot be empty",
            ));
        }
    }
    Ok(())
}
