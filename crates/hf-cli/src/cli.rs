use crate::commands::Commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "hf")]
#[command(about = "Listing favorites from the terminal, kept in sync with the site session")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Site URL (overrides server.base_url from config.toml)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Use a built-in demo site instead of the network
    #[arg(long, global = true)]
    pub offline: bool,
}
