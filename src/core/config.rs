// src/core/config.rs

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::engine::operations::registered_names;
use crate::graph::parser::INPUT_KEYWORD;

pub const DEFAULT_CONFIG_FILE: &str = "graphrt.toml";
pub const CONFIG_ENV_VAR: &str = "GRAPHRT_CONFIG";
pub const DEFAULT_SUBGRAPH_MARKER: &str = "subgraph_";
pub const DEFAULT_MAX_SLOTS: usize = 1 << 20;
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 28;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Any line whose first token contains this substring starts a subgraph.
    pub subgraph_marker: String,
    /// Node ids must be below this.
    pub max_slots: usize,
    /// Upper bound on the element count of any one declared shape.
    pub max_elements: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            subgraph_marker: DEFAULT_SUBGRAPH_MARKER.to_string(),
            max_slots: DEFAULT_MAX_SLOTS,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let marker = &self.subgraph_marker;
        if marker.is_empty() || marker.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "subgraph_marker must be a non-empty token, got {:?}",
                marker
            )));
        }
        // A marker inside a keyword would turn every such line into a marker line.
        if let Some(keyword) = std::iter::once(INPUT_KEYWORD)
            .chain(registered_names())
            .find(|k| k.contains(marker.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "subgraph_marker {:?} matches the keyword '{}'",
                marker, keyword
            )));
        }
        if self.max_slots == 0 || self.max_elements == 0 {
            return Err(ConfigError::Invalid(
                "max_slots and max_elements must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<Level, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown logging level {:?}", self.level)))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub parser: ParserConfig,
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Loads `$GRAPHRT_CONFIG`, else `./graphrt.toml`, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(path);
        }
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser.validate()?;
        self.logging.max_level()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.parser.subgraph_marker, "subgraph_");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.parser.max_slots, DEFAULT_MAX_SLOTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\nsubgraph_marker = \"graph:\"").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.parser.subgraph_marker, "graph:");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn rejects_blank_marker() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\nsubgraph_marker = \"\"").unwrap();

        assert!(matches!(
            RuntimeConfig::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"loud\"").unwrap();

        assert!(matches!(
            RuntimeConfig::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));

        let logging = LoggingConfig {
            level: "DEBUG".to_string(),
        };
        assert_eq!(logging.max_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn rejects_marker_inside_keyword() {
        for marker in ["in", "ad", "sub", "ultipl"] {
            let config = ParserConfig {
                subgraph_marker: marker.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "marker {:?} should be rejected",
                marker
            );
        }
        let config = ParserConfig {
            subgraph_marker: "graph:".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_limits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\nmax_slots = 0").unwrap();

        assert!(matches!(
            RuntimeConfig::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
