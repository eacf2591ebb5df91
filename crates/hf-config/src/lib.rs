mod config;
mod error;
mod log_level;
mod logging_config;
mod reconcile_config;
mod server_config;
mod storage_config;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use reconcile_config::ReconcileConfig;
pub use server_config::ServerConfig;
pub use storage_config::StorageConfig;

#[cfg(test)]
mod tests;

const CONFIG_DIR_ENV: &str = "HF_CONFIG_DIR";
const DEFAULT_CONFIG_DIR_NAME: &str = ".hf";
const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_COOKIE_NAME: &str = "PHPSESSID";
const DEFAULT_STORAGE_PATH: &str = "state";
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_COLORED: bool = true;
