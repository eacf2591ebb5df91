use crate::{CoreError, Result as CoreErrorResult};

use std::fmt;

use serde::Serialize;

/// Email/password pair submitted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Reject obviously malformed input before it leaves the process.
    #[track_caller]
    pub fn validate(&self) -> CoreErrorResult<()> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(CoreError::validation("password", "must not be empty"));
        }
        Ok(())
    }
}

// Never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[track_caller]
pub(crate) fn validate_email(email: &str) -> CoreErrorResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CoreError::validation("email", "must not be empty"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(CoreError::validation(
            "email",
            format!("{email:?} is not an email address"),
        )),
    }
}
