//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{ActuatorConfig, LineBlueprint, ShutdownPolicy};
use std::time::Duration;
use tracing::info;

use super::describe;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        line = %blueprint.line.name,
        sources = blueprint.sources.len(),
        pacing_ms = blueprint.line.pacing_ms,
        shutdown_policy = describe::policy(blueprint.line.shutdown_policy),
        render = %describe::render(&blueprint.render),
        actuator = %describe::actuator(&blueprint.actuator),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_runtime: (args.max_runtime > 0).then(|| Duration::from_secs(args.max_runtime)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting line...");
    let stats = pipeline.run().await?;

    info!(
        stop_reason = %stats.stop_reason,
        events = stats.counters.total_routed(),
        commands = stats.counters.actuator_commands,
        duration_secs = stats.duration.as_secs_f64(),
        "Line stopped"
    );
    stats.print_summary();
    stats.ensure_no_panics()?;

    info!("sortline finished");
    Ok(())
}

/// Apply command-line overrides, then validate again
fn apply_overrides(blueprint: &mut LineBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(ref path) = args.device {
        info!(device = %path.display(), "Overriding actuator device from CLI");
        blueprint.actuator = ActuatorConfig::Device { path: path.clone() };
    }
    if let Some(pacing_ms) = args.pacing_ms {
        info!(pacing_ms, "Overriding pacing from CLI");
        blueprint.line.pacing_ms = pacing_ms;
    }
    if let Some(policy) = args.shutdown_policy {
        let policy: ShutdownPolicy = policy.into();
        info!(
            shutdown_policy = describe::policy(policy),
            "Overriding shutdown policy from CLI"
        );
        blueprint.line.shutdown_policy = policy;
    }

    config_loader::validate(blueprint).map_err(|e| CliError::override_invalid(e.to_string()))?;
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &LineBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Line: {}", blueprint.line.name);
    println!("  Pacing: {} ms", blueprint.line.pacing_ms);
    println!(
        "  Shutdown policy: {}",
        describe::policy(blueprint.line.shutdown_policy)
    );

    println!("\nSources ({}):", blueprint.sources.len());
    for source in &blueprint.sources {
        println!(
            "  - {} → actuator {}: {}; {}",
            source.id,
            source.actuator_id,
            describe::input(&source.input),
            describe::decision(&source.decision)
        );
    }

    println!("\nOutputs:");
    println!("  Render: {}", describe::render(&blueprint.render));
    println!("  Actuator: {}", describe::actuator(&blueprint.actuator));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PolicyArg;
    use std::io::Write;

    const LINE: &str = r#"
[line]
pacing_ms = 0

[[sources]]
id = 1
actuator_id = 1
input = { kind = "synthetic", frames = 6, width = 48, height = 24, item_every = 3 }
decision = { kind = "target_color", target = "blue" }

[[sources]]
id = 2
actuator_id = 2
input = { kind = "synthetic", frames = 4, width = 48, height = 24, item_every = 3 }
decision = { kind = "target_color", target = "red" }
"#;

    fn run_args(config: &std::path::Path) -> RunArgs {
        RunArgs {
            config: config.to_path_buf(),
            device: None,
            pacing_ms: None,
            shutdown_policy: None,
            max_runtime: 0,
            dry_run: false,
            metrics_port: 0,
        }
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_overrides_apply() {
        let mut blueprint =
            config_loader::ConfigLoader::load_from_str(LINE, config_loader::ConfigFormat::Toml)
                .unwrap();
        let mut args = run_args(std::path::Path::new("unused.toml"));
        args.device = Some("/tmp/actuator".into());
        args.pacing_ms = Some(5);
        args.shutdown_policy = Some(PolicyArg::AllFinished);

        apply_overrides(&mut blueprint, &args).unwrap();
        assert!(matches!(blueprint.actuator, ActuatorConfig::Device { .. }));
        assert_eq!(blueprint.line.pacing_ms, 5);
        assert_eq!(blueprint.line.shutdown_policy, ShutdownPolicy::AllFinished);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut blueprint =
            config_loader::ConfigLoader::load_from_str(LINE, config_loader::ConfigFormat::Toml)
                .unwrap();
        let mut args = run_args(std::path::Path::new("unused.toml"));
        args.pacing_ms = Some(config_loader::MAX_PACING_MS + 1);

        let err = apply_overrides(&mut blueprint, &args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Override { .. })
        ));
    }

    #[tokio::test]
    async fn test_dry_run() {
        let file = write_config(LINE);
        let mut args = run_args(file.path());
        args.dry_run = true;
        run_pipeline(&args).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_to_completion_with_device() {
        let file = write_config(LINE);
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("actuator.log");

        let mut args = run_args(file.path());
        args.device = Some(device.clone());
        args.shutdown_policy = Some(PolicyArg::AllFinished);
        run_pipeline(&args).await.unwrap();

        let log = std::fs::read_to_string(&device).unwrap();
        assert!(log.lines().any(|l| l == "PUSH 1"));
        assert_eq!(log.lines().last(), Some("STOP"));
    }
}
