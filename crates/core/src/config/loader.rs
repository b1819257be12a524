//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, or discover one in the
    /// current directory, or fall back to defaults.
    ///
    /// An explicit path that does not exist is an error; a missing
    /// discovered file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            tracing::debug!(path = %p.display(), "loading project configuration");
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Layer files from the configuration, resolved against the
    /// configuration file's directory
    pub fn layer_paths(&self) -> Vec<PathBuf> {
        let base = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.schema
            .layers
            .files
            .iter()
            .map(|f| base.join(f))
            .collect()
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = ["droidspec.toml", ".droidspec.toml", ".config/droidspec.toml"];

    candidates
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}", path.display())).with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}: {}", path.display(), e.message()),
        )
        .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.output.format, OutputFormat::Json);
        assert!(config.layer_paths().is_empty());
    }

    #[test]
    fn test_config_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/droidspec.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_resolves_layers_relative_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("droidspec.toml");
        std::fs::write(
            &path,
            "[layers]\nfiles = [\"base.toml\", \"release.json\"]\n\n[output]\nformat = \"gradle\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.schema.output.format, OutputFormat::Gradle);
        assert_eq!(
            config.layer_paths(),
            vec![dir.path().join("base.toml"), dir.path().join("release.json")]
        );
    }

    #[test]
    fn test_config_load_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("droidspec.toml");
        std::fs::write(&path, "[output]\nformat = \"yaml\"\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }
}
