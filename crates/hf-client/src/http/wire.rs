//! JSON bodies exchanged with the session and favorites endpoints.
//!
//! The server is loose with scalar types (`"1"`, `1` and `true` all show up
//! for booleans, ids arrive as strings or numbers), so the flags and ids go
//! through lenient deserializers.

use crate::{ClientError, ClientResult, NOT_LOGGED_IN_MESSAGE};

use hf_core::{FavoriteListing, Identity, ListingId};

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(deserialize_with = "lenient_bool")]
    pub logged_in: bool,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_bool")]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
}

impl StatusResponse {
    /// `None` when the server says the session is gone.
    pub(crate) fn into_identity(self) -> ClientResult<Option<Identity>> {
        if !self.logged_in {
            return Ok(None);
        }

        let id = self
            .user_id
            .ok_or_else(|| ClientError::protocol("session status logged_in without user_id"))?;
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ClientError::protocol("session status logged_in without email"))?;

        Ok(Some(Identity {
            id,
            email,
            is_admin: self.is_admin.unwrap_or(false),
            display_name: self.name.filter(|n| !n.trim().is_empty()),
        }))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_bool")]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl AckResponse {
    pub(crate) fn is_not_logged_in(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case(NOT_LOGGED_IN_MESSAGE))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckResponse {
    #[serde(deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(rename = "isFavorite", default, deserialize_with = "lenient_opt_bool")]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(default)]
    pub favorites: Vec<FavoriteListing>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListingRequest<'a> {
    #[serde(rename = "listingId")]
    pub listing_id: &'a ListingId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn loose_to_bool(value: LooseScalar) -> Option<bool> {
    match value {
        LooseScalar::Bool(b) => Some(b),
        LooseScalar::Int(n) => Some(n != 0),
        LooseScalar::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" | "" => Some(false),
            _ => None,
        },
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = LooseScalar::deserialize(deserializer)?;
    loose_to_bool(value).ok_or_else(|| serde::de::Error::custom("expected a boolean flag"))
}

fn lenient_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseScalar>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(v) => loose_to_bool(v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a boolean flag")),
    }
}

fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseScalar>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(LooseScalar::Int(n)) => Ok(Some(n)),
        Some(LooseScalar::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer id, got {s:?}"))),
        Some(LooseScalar::Bool(_)) => Err(serde::de::Error::custom("expected an integer id")),
    }
}
