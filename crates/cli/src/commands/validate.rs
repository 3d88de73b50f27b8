//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ActuatorConfig, InputConfig, LineBlueprint, ShutdownPolicy};
use serde::Serialize;
use tracing::info;

use super::describe;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    line: String,
    source_count: usize,
    shutdown_policy: &'static str,
    render: String,
    actuator: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    line: blueprint.line.name.clone(),
                    source_count: blueprint.sources.len(),
                    shutdown_policy: describe::policy(blueprint.line.shutdown_policy),
                    render: describe::render(&blueprint.render),
                    actuator: describe::actuator(&blueprint.actuator),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &LineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if matches!(blueprint.actuator, ActuatorConfig::Log) {
        warnings.push("actuator is 'log' - commands are only logged".to_string());
    }

    if blueprint.line.pacing_ms == 0 {
        warnings.push("line.pacing_ms is 0 - workers run unthrottled".to_string());
    }

    // FirstFinished with unequal synthetic lengths cuts the longer source short
    if blueprint.line.shutdown_policy == ShutdownPolicy::FirstFinished {
        let lengths: Vec<u64> = blueprint
            .sources
            .iter()
            .filter_map(|s| match s.input {
                InputConfig::Synthetic { frames, .. } => Some(frames),
                InputConfig::Directory { .. } => None,
            })
            .collect();
        if lengths.windows(2).any(|w| w[0] != w[1]) {
            warnings.push(
                "first_finished with sources of different lengths - the line stops \
                 when the shortest source finishes"
                    .to_string(),
            );
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Line: {}", summary.line);
            println!("  Sources: {}", summary.source_count);
            println!("  Shutdown policy: {}", summary.shutdown_policy);
            println!("  Render: {}", summary.render);
            println!("  Actuator: {}", summary.actuator);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
