use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "tsbridge.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub rust: RustConfig,
    pub proto: ProtoConfig,
    /// Unsupported constructs fail the run instead of producing warnings.
    pub strict: bool,
    /// Emit the `@generated` banner with the source digest.
    pub header: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rust: RustConfig::default(),
            proto: ProtoConfig::default(),
            strict: false,
            header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RustConfig {
    pub number_type: String,
    pub decimal_type: String,
    pub derives: Vec<String>,
    /// Return wrapper used for RPC client methods, e.g. `Result<Vault>`.
    pub client_error_type: String,
}

impl Default for RustConfig {
    fn default() -> Self {
        Self {
            number_type: "u64".into(),
            decimal_type: "Decimal".into(),
            derives: ["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"]
                .into_iter()
                .map(String::from)
                .collect(),
            client_error_type: "Result".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtoConfig {
    pub package: Option<String>,
    pub number_type: String,
}

impl Default for ProtoConfig {
    fn default() -> Self {
        Self {
            package: None,
            number_type: "int32".into(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    /// Loads an explicit config, or `tsbridge.yaml` from `dir` when present,
    /// or falls back to defaults.
    pub fn discover(
        explicit: Option<&Path>,
        dir: &Path,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Ok((Self::load(&candidate)?, Some(candidate)));
        }
        Ok((Self::default(), None))
    }
}
