use serde::{Deserialize, Serialize};

/// The authenticated user as known to the client.
///
/// Persisted verbatim in local storage, so the serialized field names are
/// part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: i64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            is_admin: false,
            display_name: None,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Whether `other` refers to the same account, regardless of profile fields.
    pub fn same_user(&self, other: &Identity) -> bool {
        self.id == other.id
    }

    /// Name to greet the user with.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}
