//! Harness configuration
//!
//! Values are merged in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. `trellis.toml` at the test root
//! 3. Environment variables (`TRELLIS_SEED`, `TRELLIS_SKIP_TAGS`,
//!    `TRELLIS_NO_COLOR` / `NO_COLOR`)
//! 4. CLI flags, applied by the caller

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use trellis::Layout;

/// File looked up at the test root
pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParse {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// `trellis.toml` as written on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub layout: Option<LayoutSection>,
    #[serde(default)]
    pub run: Option<RunSection>,
}

/// `[layout]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    pub test_dir: Option<String>,
    pub extension: Option<String>,
    pub package_stem: Option<String>,
}

/// `[run]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    pub seed: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skip_tags: Vec<String>,
}

/// Effective harness settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub layout: Layout,
    /// Shuffle seed; `None` draws one from OS entropy
    pub seed: Option<u64>,
    /// Only run tests carrying at least one of these tags
    pub tags: Vec<String>,
    /// Never run tests carrying any of these tags
    pub skip_tags: Vec<String>,
    pub no_color: bool,
}

impl Config {
    /// Load `trellis.toml` from `root` (if any) and apply the environment
    pub fn load(root: &Path) -> ConfigResult<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        let mut config = if path.is_file() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Parse one configuration file, without environment overrides
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|error| ConfigError::TomlParse {
            file: path.to_path_buf(),
            error,
        })?;
        debug!(path = %path.display(), "loaded configuration file");
        Self::from_config_file(file)
    }

    fn from_config_file(file: ConfigFile) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(layout) = file.layout {
            if let Some(test_dir) = layout.test_dir {
                config.layout.test_dir = non_empty("layout.test_dir", test_dir)?;
            }
            if let Some(extension) = layout.extension {
                let extension = extension.trim_start_matches('.').to_string();
                config.layout.extension = non_empty("layout.extension", extension)?;
            }
            if let Some(stem) = layout.package_stem {
                config.layout.package_stem = non_empty("layout.package_stem", stem)?;
            }
        }

        if let Some(run) = file.run {
            config.seed = run.seed;
            config.tags = run.tags;
            config.skip_tags = run.skip_tags;
        }

        Ok(config)
    }

    fn apply_env(&mut self) -> ConfigResult<()> {
        if let Ok(seed) = env::var("TRELLIS_SEED") {
            let seed = seed.trim();
            self.seed = Some(
                seed.parse()
                    .map_err(|_| ConfigError::invalid("TRELLIS_SEED", format!("'{seed}' is not a u64")))?,
            );
        }

        if let Ok(tags) = env::var("TRELLIS_SKIP_TAGS") {
            self.skip_tags = split_list(&tags);
        }

        if env::var_os("TRELLIS_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }
}

fn non_empty(field: &str, value: String) -> ConfigResult<String> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(value)
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
