//! Signed-in user identity.

use serde::{Deserialize, Serialize};

use crate::types::Username;

/// The user record returned by login, signup, and profile updates.
///
/// Held for the lifetime of the browser session only. There is no token,
/// refresh, or expiry attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: Username,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl CurrentUser {
    /// Display name, falling back to the username when no name is set.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            self.username.as_str()
        } else {
            name
        }
    }

    /// Up to two uppercase initials for the avatar, e.g. `"Ada Lovelace"` -> `"AL"`.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = self
            .display_name()
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();

        if initials.is_empty() {
            "U".to_owned()
        } else {
            initials
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(name: &str) -> CurrentUser {
        CurrentUser {
            username: Username::new("ada"),
            name: name.to_owned(),
            email: String::new(),
            phone: String::new(),
        }
    }

    #[test]
    fn test_initials() {
        assert_eq!(user("Ada Lovelace").initials(), "AL");
        assert_eq!(user("ada king lovelace").initials(), "AK");
        assert_eq!(user("").initials(), "A");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(user("  ").display_name(), "ada");
        assert_eq!(user("Ada").display_name(), "Ada");
    }

    #[test]
    fn test_missing_contact_fields_default_to_empty() {
        let parsed: CurrentUser =
            serde_json::from_str(r#"{"username":"ada","name":"Ada"}"#).unwrap();
        assert_eq!(parsed.email, "");
        assert_eq!(parsed.phone, "");
    }
}
