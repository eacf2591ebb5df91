use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum FavoriteCommands {
    /// Like or unlike a listing
    Toggle {
        /// Listing ID
        id: String,
    },

    /// Whether a listing is liked
    Check {
        /// Listing ID
        id: String,

        /// Ask the site instead of answering from the local cache
        #[arg(long)]
        refresh: bool,
    },

    /// Locally cached favorites
    List,

    /// Replace the local favorites with the site's list
    Sync,
}
