use crate::{LISTING_ID_MAX_LENGTH, ListingId};

use googletest::assert_that;
use googletest::prelude::{anything, err, ok};
use proptest::prelude::*;

#[test]
fn test_listing_id_parse_trims_whitespace() {
    let id = ListingId::parse("  42 ").unwrap();
    assert_eq!(id.as_str(), "42");
}

#[test]
fn test_listing_id_rejects_empty() {
    assert_that!(ListingId::parse(""), err(anything()));
    assert_that!(ListingId::parse("   "), err(anything()));
}

#[test]
fn test_listing_id_rejects_invalid_characters() {
    let result = ListingId::parse("42; DROP TABLE");
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().field(), "listingId");
}

#[test]
fn test_listing_id_rejects_overlong() {
    let raw = "1".repeat(LISTING_ID_MAX_LENGTH + 1);
    assert_that!(ListingId::parse(&raw), err(anything()));

    let raw = "1".repeat(LISTING_ID_MAX_LENGTH);
    assert_that!(ListingId::parse(&raw), ok(anything()));
}

#[test]
fn test_listing_id_numeric_serializes_as_number() {
    let id = ListingId::from(42);
    assert_eq!(serde_json::to_string(&id).unwrap(), "42");
}

#[test]
fn test_listing_id_slug_serializes_as_string() {
    let id = ListingId::parse("villa-7").unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"villa-7\"");
    assert_eq!(id.as_number(), None);
}

#[test]
fn test_listing_id_leading_zeros_serialize_as_string() {
    let id = ListingId::parse("007").unwrap();
    assert_eq!(id.as_number(), None);
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"007\"");

    let back: ListingId = serde_json::from_str("\"007\"").unwrap();
    assert_eq!(back, id);
    assert_ne!(back, ListingId::from(7));
}

#[test]
fn test_listing_id_zero_serializes_as_number() {
    let id = ListingId::parse("0").unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "0");
}

#[test]
fn test_listing_id_deserializes_from_number_or_string() {
    let ids: Vec<ListingId> = serde_json::from_str(r#"[7, "7", "loft_3"]"#).unwrap();
    assert_eq!(ids[0], ids[1]);
    assert_eq!(ids[2].as_str(), "loft_3");
}

#[test]
fn test_listing_id_deserialize_rejects_garbage() {
    let result = serde_json::from_str::<ListingId>(r#""a b""#);
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn given_valid_identifier_when_parsed_then_display_matches(raw in "[A-Za-z0-9_-]{1,64}") {
        let id = ListingId::parse(&raw).unwrap();
        prop_assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn given_integer_when_serialized_then_reads_back_equal(n in 0i64..i64::MAX) {
        let id = ListingId::from(n);
        let json = serde_json::to_string(&id).unwrap();
        let back: ListingId = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, id);
    }

    #[test]
    fn given_leading_zero_identifier_when_serialized_then_reads_back_equal(raw in "0[0-9]{1,5}") {
        let id = ListingId::parse(&raw).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let back: ListingId = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.as_str(), raw.as_str());
    }
}
