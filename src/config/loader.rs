//! Configuration Loader
//!
//! Environment-aware loading: base YAML file, optional per-environment overlay,
//! then `BOOKING_LIFECYCLE__*` environment variables, merged by the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::LifecycleConfig;
use crate::constants::config_files;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loaded configuration plus the context it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: LifecycleConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading booking lifecycle configuration"
        );

        let base_file = Self::find_config_file(&config_directory)?;
        let overlay_file = config_directory.join(format!(
            "{}.{}.yaml",
            config_files::BASE_NAME,
            environment
        ));

        let config = Self::load_and_merge_config(&base_file, &overlay_file)?;
        config.validate()?;

        info!(
            environment = %environment,
            tick_interval_seconds = config.scheduler.tick_interval_seconds,
            worker_concurrency = config.scheduler.worker_concurrency,
            custom_transitions = config.transitions.is_some(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Load from disk, falling back to defaults when no configuration file exists
    ///
    /// Only a missing file falls back; a present but invalid file is still an error.
    pub fn load_or_default() -> ConfigResult<Arc<ConfigManager>> {
        match Self::load() {
            Err(ConfigurationError::ConfigFileNotFound { searched_paths }) => {
                warn!(
                    ?searched_paths,
                    "No configuration file found - using built-in defaults"
                );
                Ok(Arc::new(Self::from_config(
                    LifecycleConfig::default(),
                    &Self::detect_environment(),
                )?))
            }
            other => other,
        }
    }

    /// Wrap an in-memory configuration (tests, embedding)
    pub fn from_config(config: LifecycleConfig, environment: &str) -> ConfigResult<ConfigManager> {
        config.validate()?;
        Ok(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn load_and_merge_config(base_file: &Path, overlay_file: &Path) -> ConfigResult<LifecycleConfig> {
        if overlay_file.is_file() {
            debug!(overlay = %overlay_file.display(), "Applying environment-specific overrides");
        }

        let settings = Config::builder()
            .add_source(File::from(base_file).format(FileFormat::Yaml).required(true))
            .add_source(
                File::from(overlay_file)
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(config_files::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_failed(base_file.display().to_string(), e))?;

        settings
            .try_deserialize::<LifecycleConfig>()
            .map_err(|e| ConfigurationError::load_failed(base_file.display().to_string(), e))
    }

    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let candidates: Vec<PathBuf> = ["yaml", "yml"]
            .iter()
            .map(|ext| config_directory.join(format!("{}.{ext}", config_files::BASE_NAME)))
            .collect();

        candidates
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| ConfigurationError::config_file_not_found(candidates))
    }

    /// Detect environment from environment variables
    pub fn detect_environment() -> String {
        env::var(config_files::ENVIRONMENT_VARIABLE)
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| config_files::DEFAULT_ENVIRONMENT.to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var(config_files::CONFIG_DIR_VARIABLE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}
