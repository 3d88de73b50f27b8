//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, LineBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<LineBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<LineBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<LineBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DecisionConfig, InputConfig, ShutdownPolicy, SourceId};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[line]
shutdown_policy = "all_finished"

[[sources]]
id = 1
actuator_id = 1
input = { kind = "directory", path = "frames/cam1" }

[sources.decision]
kind = "defect_probability"
defect_class = "x"
threshold = 0.8
model = { source = "file", path = "models/defect.json" }
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.line.shutdown_policy, ShutdownPolicy::AllFinished);
        assert_eq!(bp.line.pacing_ms, 30);
        assert_eq!(bp.sources.len(), 1);
        assert_eq!(bp.sources[0].id, SourceId::new(1));
        assert!(matches!(bp.sources[0].input, InputConfig::Directory { .. }));
        assert!(matches!(
            bp.sources[0].decision,
            DecisionConfig::DefectProbability { threshold, .. } if threshold == 0.8
        ));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "sources": [{
                "id": 2,
                "actuator_id": 2,
                "input": { "kind": "synthetic", "frames": 50 },
                "decision": { "kind": "target_color", "target": "blue" }
            }],
            "render": { "kind": "snapshot", "dir": "out" }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_decision_kind_is_parse_error() {
        let content = r#"
[[sources]]
id = 1
actuator_id = 1
input = { kind = "synthetic", frames = 1 }
decision = { kind = "coin_flip" }
"#;
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
