//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigSchema {
    #[serde(default)]
    pub layers: LayersConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub lint: LintConfig,
}

/// Default descriptor layers, lowest precedence first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayersConfig {
    /// Layer files, relative to the configuration file
    #[serde(default)]
    pub files: Vec<String>,
}

/// Output preferences
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Format used by `resolve` when none is given on the command line
    #[serde(default)]
    pub format: OutputFormat,
}

/// Lint preferences
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LintConfig {
    /// Treat lint warnings as failures
    #[serde(default)]
    pub strict: bool,
}

/// Rendering format for resolved descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
    Gradle,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "gradle" | "kts" => Ok(Self::Gradle),
            other => Err(format!("unknown output format '{other}' (expected json, toml or gradle)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Gradle => "gradle",
        };
        f.write_str(name)
    }
}
