//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{SinkConfig, SourceConfig, TeeBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: EndpointInfo,
    read_capacity: usize,
    on_sink_error: String,
    sinks: Vec<EndpointInfo>,
}

#[derive(Serialize)]
struct EndpointInfo {
    name: String,
    kind: String,
    target: String,
    close_on_end: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn source_info(source: &SourceConfig) -> EndpointInfo {
    let kind = format!("{:?}", source.kind).to_lowercase();
    let (target, default_close) = match (&source.path, &source.addr) {
        (Some(path), _) => (path.display().to_string(), true),
        (None, Some(addr)) => (addr.clone(), true),
        (None, None) => ("-".to_string(), false),
    };
    EndpointInfo {
        name: "source".into(),
        kind,
        target,
        close_on_end: source.close_on_end.unwrap_or(default_close),
    }
}

fn sink_info(sink: &SinkConfig) -> EndpointInfo {
    let (target, default_close) = match (&sink.path, &sink.addr) {
        (Some(path), _) => (
            format!(
                "{}{}",
                path.display(),
                if sink.append { " (append)" } else { "" }
            ),
            true,
        ),
        (None, Some(addr)) => (addr.clone(), true),
        (None, None) => ("-".to_string(), false),
    };
    EndpointInfo {
        name: sink.name.clone(),
        kind: format!("{:?}", sink.kind).to_lowercase(),
        target,
        close_on_end: sink.close_on_end.unwrap_or(default_close),
    }
}

fn build_config_info(blueprint: &TeeBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        source: source_info(&blueprint.source),
        read_capacity: blueprint.engine.read_capacity,
        on_sink_error: format!("{:?}", blueprint.engine.on_sink_error).to_lowercase(),
        sinks: blueprint.sinks.iter().map(sink_info).collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== fanout configuration ({}) ===\n", info.version);

    println!("Source");
    println!(
        "   └─ {} {} (close on end: {})",
        info.source.kind, info.source.target, info.source.close_on_end
    );

    println!("\nEngine");
    println!("   ├─ Read capacity: {} bytes", info.read_capacity);
    println!("   └─ On sink error: {}", info.on_sink_error);

    println!("\nSinks ({})", info.sinks.len());
    for (i, sink) in info.sinks.iter().enumerate() {
        let prefix = if i + 1 == info.sinks.len() {
            "└─"
        } else {
            "├─"
        };
        println!(
            "   {} {} [{}] {} (close on end: {})",
            prefix, sink.name, sink.kind, sink.target, sink.close_on_end
        );
    }

    println!();
}
