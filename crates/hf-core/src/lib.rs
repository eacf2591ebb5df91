pub mod error;
pub mod models;

pub use error::{CoreError, Result};
pub use models::credentials::Credentials;
pub use models::favorite_listing::FavoriteListing;
pub use models::identity::Identity;
pub use models::listing_id::{LISTING_ID_MAX_LENGTH, ListingId};
pub use models::registration::Registration;

#[cfg(test)]
mod tests;
