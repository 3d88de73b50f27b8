//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `LineBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Line: {} ({} sources)", blueprint.line.name, blueprint.sources.len());
//! ```

mod parser;
mod validator;

pub use contracts::LineBlueprint;
pub use parser::ConfigFormat;
pub use validator::MAX_PACING_MS;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<LineBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LineBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize LineBlueprint to TOML string
    pub fn to_toml(blueprint: &LineBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize LineBlueprint to JSON string
    pub fn to_json(blueprint: &LineBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LineBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

/// Validate a blueprint that was modified after loading (CLI overrides)
pub fn validate(blueprint: &LineBlueprint) -> Result<(), ContractError> {
    validator::validate(blueprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ActuatorConfig, RenderConfig, SourceId};

    const MINIMAL_TOML: &str = r#"
[line]
name = "test-line"
pacing_ms = 10

[[sources]]
id = 1
actuator_id = 1
input = { kind = "directory", path = "frames/cam1" }
[sources.decision]
kind = "defect_probability"
defect_class = "x"
threshold = 0.8
[sources.decision.model]
source = "inline"
classes = [
    { name = "x", weights = [2.0, -1.0, -1.0] },
    { name = "circle", weights = [-1.0, -1.0, 2.0] },
]

[[sources]]
id = 2
actuator_id = 2
input = { kind = "synthetic", frames = 100 }
decision = { kind = "target_color", target = "blue" }

[render]
kind = "snapshot"
dir = "out/displays"

[actuator]
kind = "device"
path = "/dev/ttyACM0"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.line.name, "test-line");
        assert_eq!(bp.source_ids(), vec![SourceId::new(1), SourceId::new(2)]);
        assert!(matches!(bp.render, RenderConfig::Snapshot { .. }));
        assert!(matches!(bp.actuator, ActuatorConfig::Device { .. }));
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.line.name, bp2.line.name);
        assert_eq!(bp.source_ids(), bp2.source_ids());
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.line.pacing_ms, bp2.line.pacing_ms);
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();
        assert!(ConfigLoader::load_from_path(&path).is_ok());

        let yaml = dir.path().join("line.yaml");
        std::fs::write(&yaml, "sources: []").unwrap();
        let err = ConfigLoader::load_from_path(&yaml).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Duplicate actuator id should fail validation
        let content = r#"
[[sources]]
id = 1
actuator_id = 7
input = { kind = "synthetic", frames = 5 }
decision = { kind = "target_color", target = "red" }

[[sources]]
id = 2
actuator_id = 7
input = { kind = "synthetic", frames = 5 }
decision = { kind = "target_color", target = "blue" }
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}
