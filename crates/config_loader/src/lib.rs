//! # Config Loader
//!
//! Turns a TOML or JSON session file into a checked [`TeeBlueprint`]:
//! one source, any number of named sinks and the engine settings.
//! Blueprints built in code (the CLI tee layout) go through the same
//! [`ConfigLoader::validate`] rules.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! # fn demo() -> Result<(), contracts::ContractError> {
//! let blueprint = ConfigLoader::load_from_path(Path::new("fanout.toml"))?;
//! for sink in &blueprint.sinks {
//!     println!("{} -> {:?}", sink.name, sink.kind);
//! }
//! # Ok(())
//! # }
//! ```

mod parser;
mod validator;

pub use contracts::TeeBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Entry point for reading and writing session files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read `path`, picking the format from its extension
    ///
    /// # Errors
    /// `ConfigParse` for an unknown extension or malformed content,
    /// `ConfigValidation` when the blueprint breaks a rule, `Io` when the
    /// file cannot be read.
    pub fn load_from_path(path: &Path) -> Result<TeeBlueprint, ContractError> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ConfigFormat::from_extension)
            .ok_or_else(|| {
                ContractError::config_parse(format!(
                    "{}: expected a .toml or .json file",
                    path.display()
                ))
            })?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<TeeBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Check a blueprint that did not come from a file
    pub fn validate(blueprint: &TeeBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &TeeBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("cannot write TOML: {e}")))
    }

    pub fn to_json(blueprint: &TeeBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("cannot write JSON: {e}")))
    }
}
