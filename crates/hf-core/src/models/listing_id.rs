use crate::{CoreError, Result as CoreErrorResult};

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const LISTING_ID_MAX_LENGTH: usize = 64;

/// Identifier of a property listing.
///
/// The server hands these out as integers, but some endpoints echo them back
/// as strings, so both forms are accepted. Only ASCII alphanumerics, `-` and
/// `_` are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListingId(String);

impl ListingId {
    /// Validate and wrap a raw identifier.
    #[track_caller]
    pub fn parse(raw: &str) -> CoreErrorResult<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(CoreError::validation("listingId", "must not be empty"));
        }

        if trimmed.len() > LISTING_ID_MAX_LENGTH {
            return Err(CoreError::validation(
                "listingId",
                format!(
                    "must be at most {} characters, got {}",
                    LISTING_ID_MAX_LENGTH,
                    trimmed.len()
                ),
            ));
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(CoreError::validation(
                "listingId",
                format!("contains invalid character {bad:?}"),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form, when the identifier is a plain integer written
    /// canonically. `"007"` has none: as a number it would read back as `"7"`.
    pub fn as_number(&self) -> Option<i64> {
        if !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0
            .parse::<i64>()
            .ok()
            .filter(|n| n.to_string() == self.0)
    }
}

impl From<i64> for ListingId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for ListingId {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreErrorResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ListingId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_number() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ListingId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ListingIdVisitor;

        impl Visitor<'_> for ListingIdVisitor {
            type Value = ListingId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a listing identifier as string or integer")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ListingId, E> {
                Ok(ListingId::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ListingId, E> {
                ListingId::parse(&v.to_string()).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ListingId, E> {
                ListingId::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ListingIdVisitor)
    }
}
