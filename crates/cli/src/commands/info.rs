//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::LineBlueprint;
use serde::Serialize;
use tracing::info;

use super::describe;
use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    line: LineInfo,
    sources: Vec<SourceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<OutputInfo>,
}

#[derive(Serialize)]
struct LineInfo {
    name: String,
    pacing_ms: u64,
    dequeue_timeout_ms: u64,
    shutdown_policy: &'static str,
}

#[derive(Serialize)]
struct SourceInfo {
    id: u8,
    actuator_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<String>,
}

#[derive(Serialize)]
struct OutputInfo {
    render: String,
    actuator: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &LineBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sources = blueprint
        .sources
        .iter()
        .map(|s| SourceInfo {
            id: s.id.get(),
            actuator_id: s.actuator_id,
            input: args.sources.then(|| describe::input(&s.input)),
            detector: args.sources.then(|| describe::detector(&s.detector)),
            decision: args.sources.then(|| describe::decision(&s.decision)),
        })
        .collect();

    let outputs = args.outputs.then(|| OutputInfo {
        render: describe::render(&blueprint.render),
        actuator: describe::actuator(&blueprint.actuator),
    });

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        line: LineInfo {
            name: blueprint.line.name.clone(),
            pacing_ms: blueprint.line.pacing_ms,
            dequeue_timeout_ms: blueprint.line.dequeue_timeout_ms,
            shutdown_policy: describe::policy(blueprint.line.shutdown_policy),
        },
        sources,
        outputs,
    }
}

fn print_config_info(blueprint: &LineBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Sorting Line Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let line = &blueprint.line;
    println!("🏭 Line");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Name: {}", line.name);
    println!("   ├─ Pacing: {} ms", line.pacing_ms);
    println!("   ├─ Dequeue timeout: {} ms", line.dequeue_timeout_ms);
    println!(
        "   └─ Shutdown policy: {}",
        describe::policy(line.shutdown_policy)
    );

    println!("\n📷 Sources ({})", blueprint.sources.len());
    for (i, source) in blueprint.sources.iter().enumerate() {
        let is_last = i == blueprint.sources.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} → actuator {}", prefix, source.id, source.actuator_id);

        if args.sources {
            println!("   {}  ├─ Input: {}", child_prefix, describe::input(&source.input));
            println!(
                "   {}  ├─ Detector: {}",
                child_prefix,
                describe::detector(&source.detector)
            );
            println!(
                "   {}  └─ Decision: {}",
                child_prefix,
                describe::decision(&source.decision)
            );
        }
    }

    if args.outputs {
        println!("\n📤 Outputs");
        println!("   ├─ Render: {}", describe::render(&blueprint.render));
        println!("   └─ Actuator: {}", describe::actuator(&blueprint.actuator));
    }

    println!();
}
