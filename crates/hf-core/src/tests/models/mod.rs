mod credentials;
mod identity;
mod listing_id;
