//! User registration types for `SyncBoard`.
//!
//! Users are registered once per external id and fetched unchanged on every
//! later attempt. There is no ordering or consistency concern here; the types
//! only shape the idempotent register-or-fetch request.

use serde::{Deserialize, Serialize};

/// A registered user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// External identity-provider id; the upsert key.
    pub uid: String,
    /// User email address.
    pub email: String,
    /// Display name, if the identity provider supplied one.
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    /// Avatar URL, if the identity provider supplied one.
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Registration timestamp in milliseconds since the Unix epoch.
    #[serde(rename = "createdAt")]
    pub created_at: u64,
}

/// Error returned when a registration request lacks its required fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing user details")]
pub struct MissingUserDetails;

/// Request body for registering (or fetching) a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewUser {
    /// External identity-provider id. Required.
    pub uid: Option<String>,
    /// User email address. Required.
    pub email: Option<String>,
    /// Optional display name.
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    /// Optional avatar URL.
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl NewUser {
    /// Checks that both required fields are present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`MissingUserDetails`] if `uid` or `email` is absent or empty.
    pub fn validate(&self) -> Result<(), MissingUserDetails> {
        let present = |field: &Option<String>| field.as_ref().is_some_and(|v| !v.is_empty());
        if present(&self.uid) && present(&self.email) {
            Ok(())
        } else {
            Err(MissingUserDetails)
        }
    }

    /// Builds the stored [`User`] document with the given registration time.
    ///
    /// Call [`Self::validate`] first; missing required fields become empty
    /// strings here.
    #[must_use]
    pub fn into_user(self, created_at: u64) -> User {
        User {
            uid: self.uid.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            display_name: self.display_name,
            photo_url: self.photo_url,
            created_at,
        }
    }
}
