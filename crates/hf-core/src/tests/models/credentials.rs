use crate::{Credentials, Registration};

#[test]
fn test_credentials_validate_ok() {
    assert!(Credentials::new("a@b.com", "secret").validate().is_ok());
}

#[test]
fn test_credentials_rejects_missing_at() {
    let err = Credentials::new("ab.com", "secret").validate().unwrap_err();
    assert_eq!(err.field(), "email");
}

#[test]
fn test_credentials_rejects_empty_password() {
    let err = Credentials::new("a@b.com", "").validate().unwrap_err();
    assert_eq!(err.field(), "password");
}

#[test]
fn test_credentials_debug_redacts_password() {
    let debug = format!("{:?}", Credentials::new("a@b.com", "hunter2"));
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("a@b.com"));
}

#[test]
fn test_registration_requires_name_and_password_length() {
    let mut registration = Registration {
        name: "Ann".into(),
        email: "a@b.com".into(),
        password: "longenough".into(),
    };
    assert!(registration.validate().is_ok());

    registration.password = "short".into();
    assert_eq!(registration.validate().unwrap_err().field(), "password");

    registration.password = "longenough".into();
    registration.name = "  ".into();
    assert_eq!(registration.validate().unwrap_err().field(), "name");
}
