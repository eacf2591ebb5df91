pub mod credentials;
pub mod favorite_listing;
pub mod identity;
pub mod listing_id;
pub mod registration;
