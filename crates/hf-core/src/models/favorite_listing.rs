use crate::ListingId;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the user's favorites list, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteListing {
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "created_at")]
    pub favorited_at: Option<DateTime<Utc>>,
}
