//! TeeBlueprint - Config Loader output
//!
//! Describes one fan-out session: where bytes come from, where they go, and
//! how the engine treats sink failures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeeBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Input stream
    #[serde(default)]
    pub source: SourceConfig,

    /// Engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Output streams, in dispatch order
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Input stream configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind
    #[serde(default)]
    pub kind: SourceKind,

    /// File path (`file` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Remote address (`tcp` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,

    /// Close-on-end override (None = endpoint default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_on_end: Option<bool>,
}

/// Source kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Process standard input
    #[default]
    Stdin,
    /// Regular file, read to its end
    File,
    /// TCP connection, read until the peer shuts down
    Tcp,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum bytes taken from the source per drain
    #[serde(default = "default_read_capacity")]
    pub read_capacity: usize,

    /// What a failed sink write does to the session
    #[serde(default)]
    pub on_sink_error: SinkFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_capacity: default_read_capacity(),
            on_sink_error: SinkFailurePolicy::default(),
        }
    }
}

fn default_read_capacity() -> usize {
    64 * 1024
}

/// Reaction to a sink write failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkFailurePolicy {
    /// Finish the current chunk, then end the session with the error
    #[default]
    Abort,
    /// Stop feeding the failed sink and keep serving the others
    Detach,
}

/// Output stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink kind
    pub kind: SinkKind,

    /// File path (`file` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Remote address (`tcp` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,

    /// Append instead of truncating (`file` only)
    #[serde(default)]
    pub append: bool,

    /// Close-on-end override (None = endpoint default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_on_end: Option<bool>,
}

/// Sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Process standard output
    Stdout,
    /// Process standard error
    Stderr,
    /// Regular file
    File,
    /// TCP connection
    Tcp,
}

impl SinkConfig {
    /// Standard output sink
    pub fn stdout(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SinkKind::Stdout,
            path: None,
            addr: None,
            append: false,
            close_on_end: None,
        }
    }

    /// File sink
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            name: name.into(),
            kind: SinkKind::File,
            path: Some(path.into()),
            addr: None,
            append,
            close_on_end: None,
        }
    }
}

impl TeeBlueprint {
    /// Classic `tee` layout: stdin into stdout (optional) and each file
    pub fn tee(files: &[PathBuf], append: bool, include_stdout: bool) -> Self {
        let mut sinks = Vec::with_capacity(files.len() + 1);
        if include_stdout {
            sinks.push(SinkConfig::stdout("stdout"));
        }
        for (i, path) in files.iter().enumerate() {
            sinks.push(SinkConfig::file(format!("file{i}"), path.clone(), append));
        }

        Self {
            version: ConfigVersion::V1,
            source: SourceConfig::default(),
            engine: EngineConfig::default(),
            sinks,
        }
    }

    /// Number of sinks of the given kind
    pub fn count_sinks(&self, kind: SinkKind) -> usize {
        self.sinks.iter().filter(|s| s.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.read_capacity, 65536);
        assert_eq!(engine.on_sink_error, SinkFailurePolicy::Abort);
    }

    #[test]
    fn test_tee_layout() {
        let files = vec![PathBuf::from("a.log"), PathBuf::from("b.log")];
        let blueprint = TeeBlueprint::tee(&files, true, true);

        assert_eq!(blueprint.source.kind, SourceKind::Stdin);
        assert_eq!(blueprint.sinks.len(), 3);
        assert_eq!(blueprint.sinks[0].kind, SinkKind::Stdout);
        assert_eq!(blueprint.count_sinks(SinkKind::File), 2);
        assert!(blueprint.sinks[1].append);
        assert_eq!(blueprint.sinks[2].path.as_deref(), Some(files[1].as_path()));
    }

    #[test]
    fn test_tee_without_stdout() {
        let blueprint = TeeBlueprint::tee(&[PathBuf::from("only.log")], false, false);
        assert_eq!(blueprint.sinks.len(), 1);
        assert_eq!(blueprint.count_sinks(SinkKind::Stdout), 0);
    }

    #[test]
    fn test_json_defaults_applied() {
        let json = r#"{ "sinks": [ { "name": "out", "kind": "stdout" } ] }"#;
        let blueprint: TeeBlueprint = serde_json::from_str(json).unwrap();

        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert_eq!(blueprint.source.kind, SourceKind::Stdin);
        assert_eq!(blueprint.engine.read_capacity, 65536);
        assert_eq!(blueprint.sinks[0].close_on_end, None);
        assert!(!blueprint.sinks[0].append);
    }

    #[test]
    fn test_failure_policy_snake_case() {
        let policy: SinkFailurePolicy = serde_json::from_str("\"detach\"").unwrap();
        assert_eq!(policy, SinkFailurePolicy::Detach);
    }
}
