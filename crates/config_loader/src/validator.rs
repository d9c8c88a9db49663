//! Configuration validation
//!
//! Rules:
//! - sink names are non-empty and unique
//! - `file` endpoints carry a `path`, `tcp` endpoints a `host:port` address
//! - `engine.read_capacity > 0`
//! - no file sink writes to the file being read

use std::collections::HashSet;

use contracts::{ContractError, SinkKind, SourceKind, TeeBlueprint};

/// Validate a TeeBlueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    validate_source(blueprint)?;
    validate_engine(blueprint)?;
    validate_sink_names(blueprint)?;
    validate_sink_targets(blueprint)?;
    validate_no_self_feed(blueprint)?;
    Ok(())
}

fn validate_source(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    let source = &blueprint.source;
    match source.kind {
        SourceKind::Stdin => Ok(()),
        SourceKind::File => {
            if source.path.is_none() {
                return Err(ContractError::config_validation(
                    "source.path",
                    "path is required for a file source",
                ));
            }
            Ok(())
        }
        SourceKind::Tcp => validate_addr("source.addr", source.addr.as_deref()),
    }
}

fn validate_engine(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    if blueprint.engine.read_capacity == 0 {
        return Err(ContractError::config_validation(
            "engine.read_capacity",
            "read_capacity must be > 0",
        ));
    }
    Ok(())
}

/// Sink names identify sinks in logs, metrics and reports
fn validate_sink_names(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

fn validate_sink_targets(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    for sink in &blueprint.sinks {
        match sink.kind {
            SinkKind::Stdout | SinkKind::Stderr => {}
            SinkKind::File => {
                if sink.path.is_none() {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].path", sink.name),
                        "path is required for a file sink",
                    ));
                }
            }
            SinkKind::Tcp => {
                validate_addr(&format!("sinks[{}].addr", sink.name), sink.addr.as_deref())?
            }
        }
    }
    Ok(())
}

/// A file sink on the source file would truncate or grow its own input
fn validate_no_self_feed(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
    let source = &blueprint.source;
    let Some(source_path) = source.path.as_ref().filter(|_| source.kind == SourceKind::File)
    else {
        return Ok(());
    };

    for sink in &blueprint.sinks {
        if sink.kind == SinkKind::File && sink.path.as_ref() == Some(source_path) {
            return Err(ContractError::config_validation(
                format!("sinks[{}].path", sink.name),
                format!("sink writes to the source file {}", source_path.display()),
            ));
        }
    }
    Ok(())
}

fn validate_addr(field: &str, addr: Option<&str>) -> Result<(), ContractError> {
    let Some(addr) = addr else {
        return Err(ContractError::config_validation(
            field,
            "addr is required for a tcp endpoint",
        ));
    };

    let valid = addr
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if !valid {
        return Err(ContractError::config_validation(
            field,
            format!("expected host:port, got '{addr}'"),
        ));
    }
    Ok(())
}
