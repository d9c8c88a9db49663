//! `run` command implementation.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{SinkConfig, TeeBlueprint};
use fanout::SessionOutcome;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{print_json, print_summary, Session};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let blueprint = build_blueprint(args)?;

    info!(
        source = ?blueprint.source.kind,
        sinks = blueprint.sinks.len(),
        "Configuration ready"
    );

    let report = Session::new(blueprint)
        .run()
        .await
        .context("Fan-out failed")?;

    if args.json {
        print_json(&report)?;
    } else if !report.is_complete() || report.outcome == SessionOutcome::Cancelled {
        print_summary(&report);
    }

    if report.outcome == SessionOutcome::Cancelled {
        warn!(bytes = report.bytes, "Session cancelled before end-of-stream");
    }

    report.ensure_complete()?;
    Ok(())
}

/// Blueprint from `--config`, or the tee layout when no config is given
///
/// FILE arguments are appended as file sinks in both cases.
fn build_blueprint(args: &RunArgs) -> Result<TeeBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            let mut blueprint = ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            append_file_sinks(&mut blueprint, &args.files, args.append);
            blueprint
        }
        None => TeeBlueprint::tee(&args.files, args.append, !args.no_stdout),
    };

    if let Some(policy) = args.on_sink_error {
        info!(policy = ?policy, "Overriding sink failure policy from CLI");
        blueprint.engine.on_sink_error = policy.into();
    }

    ConfigLoader::validate(&blueprint).map_err(CliError::from)?;
    Ok(blueprint)
}

/// Add FILE arguments as sinks, skipping generated names the config already uses
fn append_file_sinks(blueprint: &mut TeeBlueprint, files: &[PathBuf], append: bool) {
    let mut taken: HashSet<String> = blueprint.sinks.iter().map(|s| s.name.clone()).collect();
    let mut next = blueprint.sinks.len();
    for file in files {
        let name = loop {
            let candidate = format!("file{next}");
            next += 1;
            if taken.insert(candidate.clone()) {
                break candidate;
            }
        };
        blueprint
            .sinks
            .push(SinkConfig::file(name, file.clone(), append));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FailurePolicy;
    use contracts::{SinkFailurePolicy, SinkKind};
    use std::io::Write;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            files: Vec::new(),
            append: false,
            no_stdout: false,
            on_sink_error: None,
            metrics_port: 0,
            json: false,
        }
    }

    #[test]
    fn test_tee_layout() {
        let args = RunArgs {
            files: vec![PathBuf::from("a.log"), PathBuf::from("b.log")],
            append: true,
            ..args()
        };

        let bp = build_blueprint(&args).unwrap();
        assert_eq!(bp.sinks.len(), 3);
        assert_eq!(bp.sinks[0].kind, SinkKind::Stdout);
        assert_eq!(bp.sinks[2].name, "file1");
        assert!(bp.sinks[2].append);
    }

    #[test]
    fn test_no_stdout() {
        let args = RunArgs {
            files: vec![PathBuf::from("a.log")],
            no_stdout: true,
            on_sink_error: Some(FailurePolicy::Detach),
            ..args()
        };

        let bp = build_blueprint(&args).unwrap();
        assert_eq!(bp.count_sinks(SinkKind::Stdout), 0);
        assert_eq!(bp.engine.on_sink_error, SinkFailurePolicy::Detach);
    }

    #[test]
    fn test_config_plus_files() {
        let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        config
            .write_all(b"[[sinks]]\nname = \"err\"\nkind = \"stderr\"\n")
            .unwrap();

        let args = RunArgs {
            config: Some(config.path().to_path_buf()),
            files: vec![PathBuf::from("extra.log")],
            ..args()
        };

        let bp = build_blueprint(&args).unwrap();
        assert_eq!(bp.sinks.len(), 2);
        assert_eq!(bp.sinks[1].name, "file1");
        assert_eq!(bp.sinks[1].kind, SinkKind::File);
    }

    #[test]
    fn test_generated_names_skip_config_names() {
        let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        config
            .write_all(
                b"[[sinks]]\nname = \"file1\"\nkind = \"stderr\"\n\n\
                  [[sinks]]\nname = \"file2\"\nkind = \"stdout\"\n",
            )
            .unwrap();

        let args = RunArgs {
            config: Some(config.path().to_path_buf()),
            files: vec![PathBuf::from("a.log"), PathBuf::from("b.log")],
            ..args()
        };

        let bp = build_blueprint(&args).unwrap();
        let names: Vec<&str> = bp.sinks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["file1", "file2", "file3", "file4"]);
    }

    #[test]
    fn test_missing_config() {
        let args = RunArgs {
            config: Some(PathBuf::from("/nonexistent/fanout.toml")),
            ..args()
        };

        let err = build_blueprint(&args).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
