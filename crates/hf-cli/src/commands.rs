use crate::favorite_commands::FavoriteCommands;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign out here and on the site
    Logout,

    /// Show the locally known identity
    Whoami,

    /// Check the local identity against the site now
    Reconcile,

    /// Keep checking in the background until Ctrl-C
    ///
    /// Lines `visible` and `hidden` on stdin simulate the view being shown
    /// and hidden.
    Watch,

    /// Favorite operations
    Favorite {
        #[command(subcommand)]
        action: FavoriteCommands,
    },
}
