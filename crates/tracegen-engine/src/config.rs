//! Engine configuration.
//!
//! Read-only for the lifetime of an [`Evaluator`](crate::Evaluator); every run
//! receives it at construction rather than through process-wide state.
//!
//! ```toml
//! strategy = "merge"
//! output-root = "./generated"
//! default-resource = "preview.txt"
//! missing-argument = "fail"
//! lost-suffix = ".lost"
//!
//! [markers]
//! start = "Start of user code"
//! end = "End of user code"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_resource() -> String {
    "generated.txt".to_string()
}

fn default_lost_suffix() -> String {
    ".lost".to_string()
}

fn default_start_marker() -> String {
    "Start of user code".to_string()
}

fn default_end_marker() -> String {
    "End of user code".to_string()
}

/// Where emitted text materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// In memory only; no filesystem writes.
    #[default]
    Preview,
    /// Replace existing files.
    Overwrite,
    /// Preserve protected regions of existing files.
    Merge,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preview => write!(f, "preview"),
            Self::Overwrite => write!(f, "overwrite"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preview" => Ok(Self::Preview),
            "overwrite" => Ok(Self::Overwrite),
            "merge" => Ok(Self::Merge),
            other => Err(ConfigError::InvalidValue {
                key: "strategy".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// What the binder does when a parameter can be satisfied neither by name nor
/// by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingArgumentPolicy {
    #[default]
    Fail,
    SubstituteNull,
}

/// Protected region marker texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMarkers {
    #[serde(default = "default_start_marker")]
    pub start: String,
    #[serde(default = "default_end_marker")]
    pub end: String,
}

impl Default for RegionMarkers {
    fn default() -> Self {
        Self {
            start: default_start_marker(),
            end: default_end_marker(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Directory generated file locations are resolved against.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Resource receiving text emitted outside any `file` block.
    #[serde(default = "default_resource")]
    pub default_resource: String,

    #[serde(default)]
    pub missing_argument: MissingArgumentPolicy,

    #[serde(default)]
    pub markers: RegionMarkers,

    /// Suffix of the file collecting protected regions that were not regenerated.
    #[serde(default = "default_lost_suffix")]
    pub lost_suffix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            output_root: default_output_root(),
            default_resource: default_resource(),
            missing_argument: MissingArgumentPolicy::default(),
            markers: RegionMarkers::default(),
            lost_suffix: default_lost_suffix(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(?path, strategy = %config.strategy, "Loaded engine config");
        Ok(config)
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Reject blank markers and an empty default resource.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markers.start.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "markers.start".to_string(),
                value: self.markers.start.clone(),
            });
        }
        if self.markers.end.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "markers.end".to_string(),
                value: self.markers.end.clone(),
            });
        }
        if self.default_resource.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "default-resource".to_string(),
                value: self.default_resource.clone(),
            });
        }
        Ok(())
    }
}
