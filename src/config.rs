//! @ai:module:intent Configuration structs for the converter
//! @ai:module:layer infrastructure
//! @ai:module:public_api Config, InputConfig, OutputConfig, RuleConfig, RuleLevel
//! @ai:module:stateless true

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent Main configuration for a conversion run
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub rules: RuleConfig,
}

/// @ai:intent How the parsed Doxygen tree is interpreted
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Language used when neither a compound nor its parents declare one.
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_header_extensions")]
    pub header_extensions: Vec<String>,
}

/// @ai:intent Shape of the emitted LOBSTER document
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub include_status: bool,
    #[serde(default)]
    pub include_groups: bool,
    /// Leave out file records and untagged containers that have children.
    #[serde(default)]
    pub omit_untagged_containers: bool,
    #[serde(default = "default_generator")]
    pub generator: String,
}

/// @ai:intent Strictness of the optional structural rules
/// @ai:effects pure
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleLevel {
    #[default]
    Off,
    Warn,
    Error,
}

/// @ai:intent Structural rules applied to the resolved items
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleConfig {
    #[serde(default)]
    pub file_level_tags: RuleLevel,
    #[serde(default)]
    pub nested_tags: RuleLevel,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            header_extensions: default_header_extensions(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_status: true,
            include_groups: false,
            omit_untagged_containers: false,
            generator: default_generator(),
        }
    }
}

fn default_language() -> String {
    "C++".to_string()
}

fn default_header_extensions() -> Vec<String> {
    ["h", "hh", "hpp", "hxx", "h++", "inl"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_generator() -> String {
    "lobster-doxygen".to_string()
}

fn default_true() -> bool {
    true
}

impl RuleConfig {
    /// @ai:intent Reject file-level tags and tags on both a container and its children
    pub fn strict() -> Self {
        Self {
            file_level_tags: RuleLevel::Error,
            nested_tags: RuleLevel::Error,
        }
    }
}

impl Config {
    /// @ai:intent Configuration with every rule set to error
    pub fn strict() -> Self {
        Self {
            rules: RuleConfig::strict(),
            ..Default::default()
        }
    }

    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Check values serde cannot check
    /// @ai:effects pure
    pub fn validate(&self) -> Result<()> {
        if self.input.default_language.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "input.default_language must not be empty".to_string(),
            ));
        }
        if self.output.generator.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "output.generator must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl InputConfig {
    /// @ai:intent Check whether a path names a header file
    /// @ai:example ("src/Foo.h") -> true
    /// @ai:example ("src/Foo.cpp") -> false
    /// @ai:effects pure
    pub fn is_header(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.header_extensions
                    .iter()
                    .any(|h| h.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
