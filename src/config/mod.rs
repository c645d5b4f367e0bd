//! Navigator configuration.
//!
//! Loaded from YAML files and environment variables into a single
//! `NavigatorConfig`.

use serde::Deserialize;

use crate::error::ConfigError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "corenav.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "CORENAV_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "CORENAV";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "CORENAV_LOG";

/// History configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of history items kept. `None` keeps everything.
    pub capacity: Option<usize>,
}

/// Destination cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, request cache policies are ignored.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Main navigator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Animation flag for requests that do not set one.
    pub animated: bool,
    /// History configuration.
    pub history: HistoryConfig,
    /// Cache configuration.
    pub cache: CacheConfig,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            animated: true,
            history: HistoryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl NavigatorConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `corenav.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
