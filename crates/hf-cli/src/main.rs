//! hf - listing favorites CLI
//!
//! Keeps a local copy of "who am I" and "what have I liked" consistent with
//! the site's session.
//!
//! # Examples
//!
//! ```bash
//! # Sign in
//! hf login --email ann@example.com --password secret
//!
//! # Like a listing
//! hf favorite toggle 42 --pretty
//!
//! # Try it without a server
//! hf --offline login --email demo@example.com --password demo-password
//! ```

use hf_cli::{App, Cli, CliResult};

use hf_config::Config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::Level;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let log_file = config.logging.file.as_ref().map(|file| {
        Config::config_dir()
            .map(|dir| dir.join(file))
            .unwrap_or_else(|_| PathBuf::from(file))
    });
    hf_cli::logger::initialize(config.logging.level, log_file, config.logging.colored)?;
    if log::log_enabled!(Level::Debug) {
        config.log_summary();
    }

    let app = App::open(&config, cli.server.as_deref(), cli.offline).await?;
    let value = app.execute(cli.command).await?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{}", output);

    Ok(())
}
