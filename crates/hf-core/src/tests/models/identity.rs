use crate::Identity;

#[test]
fn test_identity_persisted_field_names() {
    let identity = Identity::new(5, "a@b.com")
        .with_admin(true)
        .with_display_name("Ann");

    let json = serde_json::to_value(&identity).unwrap();

    assert_eq!(json["id"], 5);
    assert_eq!(json["email"], "a@b.com");
    assert_eq!(json["isAdmin"], true);
    assert_eq!(json["displayName"], "Ann");
}

#[test]
fn test_identity_partial_record_defaults() {
    let identity: Identity = serde_json::from_str(r#"{"id":5,"email":"a@b.com"}"#).unwrap();

    assert!(!identity.is_admin);
    assert!(identity.display_name.is_none());
    assert_eq!(identity, Identity::new(5, "a@b.com"));
}

#[test]
fn test_identity_richer_record_is_not_equal() {
    let partial = Identity::new(5, "a@b.com");
    let full = Identity::new(5, "a@b.com")
        .with_admin(true)
        .with_display_name("Ann");

    assert_ne!(partial, full);
    assert!(partial.same_user(&full));
}

#[test]
fn test_identity_label_prefers_display_name() {
    assert_eq!(Identity::new(1, "x@y.z").label(), "x@y.z");
    assert_eq!(
        Identity::new(1, "x@y.z").with_display_name("Xavier").label(),
        "Xavier"
    );
}
