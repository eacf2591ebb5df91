//! hf-cli library
//!
//! Command definitions and the [`App`] that runs them, exported for the
//! binary and for tests.

pub mod app;
pub mod cli;
pub mod commands;
pub mod error;
pub mod favorite_commands;
pub mod logger;

#[cfg(test)]
mod tests;

pub use app::App;
pub use cli::Cli;
pub use commands::Commands;
pub use error::{CliError, Result as CliResult};
pub use favorite_commands::FavoriteCommands;

/// Account built into `--offline` mode.
pub const OFFLINE_DEMO_USER_ID: i64 = 1;
pub const OFFLINE_DEMO_EMAIL: &str = "demo@example.com";
pub const OFFLINE_DEMO_PASSWORD: &str = "demo-password";
