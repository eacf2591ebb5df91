use crate::{
    CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR_NAME,
    LogLevel, LoggingConfig, ReconcileConfig, ServerConfig, StorageConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub reconcile: ReconcileConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for HF_CONFIG_DIR env var, else use ./.hf/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply HF_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: HF_CONFIG_DIR env var > ./.hf/ (relative to cwd) > ~/.hf/
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        std::env::current_dir()
            .ok()
            .or_else(dirs::home_dir)
            .map(|base| base.join(DEFAULT_CONFIG_DIR_NAME))
            .ok_or_else(|| {
                ConfigError::config("Cannot determine working or home directory")
            })
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.reconcile.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Absolute path of the local state directory.
    pub fn storage_dir(&self) -> ConfigErrorResult<PathBuf> {
        let config_dir = Self::config_dir()?;
        Ok(config_dir.join(&self.storage.path))
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {} (cookie {}, timeout {}s)",
            self.server.base_url, self.server.cookie_name, self.server.request_timeout_secs
        );
        info!(
            "  reconcile: every {}s, timeout {}s, on visible: {}",
            self.reconcile.poll_interval_secs,
            self.reconcile.timeout_secs,
            self.reconcile.check_on_visible
        );
        info!("  storage: {}", self.storage.path);
        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("HF_SERVER_BASE_URL", &mut self.server.base_url);
        Self::apply_env_string("HF_SERVER_COOKIE_NAME", &mut self.server.cookie_name);
        Self::apply_env_parse(
            "HF_SERVER_REQUEST_TIMEOUT_SECS",
            &mut self.server.request_timeout_secs,
        );

        // Reconcile
        Self::apply_env_parse(
            "HF_RECONCILE_POLL_INTERVAL_SECS",
            &mut self.reconcile.poll_interval_secs,
        );
        Self::apply_env_parse(
            "HF_RECONCILE_TIMEOUT_SECS",
            &mut self.reconcile.timeout_secs,
        );
        Self::apply_env_bool(
            "HF_RECONCILE_CHECK_ON_VISIBLE",
            &mut self.reconcile.check_on_visible,
        );

        // Storage
        Self::apply_env_string("HF_STORAGE_PATH", &mut self.storage.path);

        // Logging
        if let Ok(val) = std::env::var("HF_LOG_LEVEL") {
            self.logging.level = LogLevel::parse_lenient(&val);
        }
        Self::apply_env_bool("HF_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("HF_LOG_FILE", &mut self.logging.file);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
