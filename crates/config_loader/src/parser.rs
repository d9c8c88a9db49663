//! Configuration parsing
//!
//! TOML is the primary format, JSON is accepted as well.

use contracts::{ContractError, TeeBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<TeeBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<TeeBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse according to `format`
pub fn parse(content: &str, format: ConfigFormat) -> Result<TeeBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkFailurePolicy, SinkKind, SourceKind};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[[sinks]]
name = "console"
kind = "stdout"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.source.kind, SourceKind::Stdin);
        assert_eq!(bp.engine.read_capacity, 64 * 1024);
        assert_eq!(bp.engine.on_sink_error, SinkFailurePolicy::Abort);
        assert_eq!(bp.sinks.len(), 1);
        assert_eq!(bp.sinks[0].kind, SinkKind::Stdout);
        assert_eq!(bp.sinks[0].close_on_end, None);
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
version = "V1"

[source]
kind = "file"
path = "in.bin"
close_on_end = false

[engine]
read_capacity = 4096
on_sink_error = "detach"

[[sinks]]
name = "archive"
kind = "file"
path = "out.bin"
append = true

[[sinks]]
name = "remote"
kind = "tcp"
addr = "127.0.0.1:9000"
close_on_end = false
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.source.kind, SourceKind::File);
        assert_eq!(bp.source.close_on_end, Some(false));
        assert_eq!(bp.engine.read_capacity, 4096);
        assert_eq!(bp.engine.on_sink_error, SinkFailurePolicy::Detach);
        assert!(bp.sinks[0].append);
        assert_eq!(bp.sinks[1].addr.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(bp.sinks[1].close_on_end, Some(false));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "source": { "kind": "tcp", "addr": "localhost:7000" },
            "sinks": [{ "name": "err", "kind": "stderr" }]
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.source.kind, SourceKind::Tcp);
        assert_eq!(bp.sinks[0].kind, SinkKind::Stderr);
    }

    #[test]
    fn test_parse_unknown_kind() {
        let content = r#"
[[sinks]]
name = "x"
kind = "carrier_pigeon"
"#;
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
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
