use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::ids::timestamp_id;

pub mod document;

pub use document::{DocumentDraft, DocumentStatus, InsuranceDocument, TravelerDetails, TripDetails};

/// Profile keys that map onto typed `User` fields and never land in `profile`
const RESERVED_PROFILE_KEYS: &[&str] = &["id", "email", "name", "createdAt", "authCode", "token"];

/// Signed-in user record, persisted under the `user` key
///
/// Host-supplied profile fields that have no typed counterpart are kept in
/// `profile` and flattened back into the stored JSON.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl User {
    /// Create a local-only user with a timestamp-derived identifier
    #[must_use]
    pub fn local(email: &str, name: &str) -> Self {
        Self {
            id: timestamp_id(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            auth_code: None,
            profile: Map::new(),
        }
    }

    /// Normalize the profile returned by the auth endpoint into a user record
    ///
    /// * `id` falls back to a timestamp-derived value
    /// * `email` falls back to `phone`, then to `contact_fallback`
    /// * `name` falls back to `nickname`, then to `default_name`
    #[must_use]
    pub fn from_host_profile(
        profile: &Map<String, Value>,
        auth_code: &str,
        contact_fallback: &str,
        default_name: &str,
    ) -> Self {
        let id = profile_string(profile, "id").unwrap_or_else(timestamp_id);
        let email = profile_string(profile, "email")
            .or_else(|| profile_string(profile, "phone"))
            .unwrap_or_else(|| contact_fallback.to_string());
        let name = profile_string(profile, "name")
            .or_else(|| profile_string(profile, "nickname"))
            .unwrap_or_else(|| default_name.to_string());

        let extras = profile
            .iter()
            .filter(|(key, _)| !RESERVED_PROFILE_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            id,
            email,
            name,
            created_at: Utc::now(),
            auth_code: Some(auth_code.to_string()),
            profile: extras,
        }
    }

    /// Local part of an email address, used as the display name of local users
    #[must_use]
    pub fn name_from_email(email: &str) -> &str {
        email.split('@').next().unwrap_or(email)
    }
}

/// Read a profile field as a non-empty string; numbers are stringified
fn profile_string(profile: &Map<String, Value>, key: &str) -> Option<String> {
    match profile.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
