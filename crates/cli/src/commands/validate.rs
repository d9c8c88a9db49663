//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{SinkKind, SourceKind, TeeBlueprint};
use serde::Serialize;
use tracing::info;

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
    source: String,
    sink_count: usize,
    on_sink_error: String,
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
                    source: format!("{:?}", blueprint.source.kind),
                    sink_count: blueprint.sinks.len(),
                    on_sink_error: format!("{:?}", blueprint.engine.on_sink_error),
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
fn collect_warnings(blueprint: &TeeBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - the source will be drained and discarded".into());
    }

    if blueprint.count_sinks(SinkKind::Stdout) > 1 {
        warnings.push("Several stdout sinks - output will be interleaved chunk by chunk".into());
    }

    let mut paths: Vec<_> = blueprint
        .sinks
        .iter()
        .filter(|s| s.kind == SinkKind::File)
        .filter_map(|s| s.path.as_ref())
        .collect();
    paths.sort();
    if paths.windows(2).any(|w| w[0] == w[1]) {
        warnings.push("Several file sinks share a path".into());
    }

    if blueprint.source.kind == SourceKind::Stdin && blueprint.source.close_on_end == Some(true) {
        warnings.push("source.close_on_end = true closes this process's stdin".into());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Source: {}", summary.source);
            println!("  Sinks: {}", summary.sink_count);
            println!("  On sink error: {}", summary.on_sink_error);
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

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkConfig;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_warnings() {
        let mut bp = TeeBlueprint::tee(&[PathBuf::from("a"), PathBuf::from("a")], false, true);
        bp.sinks.push(SinkConfig::stdout("again"));

        let warnings = collect_warnings(&bp);
        assert_eq!(warnings.len(), 2, "{warnings:?}");
    }

    #[test]
    fn test_validate_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[engine]\nread_capacity = 0\n").unwrap();

        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("read_capacity"));
    }
}
