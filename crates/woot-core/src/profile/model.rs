//! Profile domain model.
//!
//! Represents the signed-in agent's display name and avatar, and the header
//! state a native shell renders from it.

use serde::{Deserialize, Serialize};

/// Name shown while the profile is unresolved or when resolution failed.
pub const PLACEHOLDER_NAME: &str = "Chat User";

/// Rendered in place of initials when the name has no usable characters.
pub const FALLBACK_INITIALS: &str = "?";

/// Profile domain model.
///
/// Once resolution completes a profile always exists; failures resolve to
/// [`Profile::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Absolute avatar URL, absent when the account has none
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Creates a profile, treating blank values as missing.
    pub fn new(name: impl Into<String>, avatar_url: Option<String>) -> Self {
        let name = name.into();
        Self {
            name: if name.trim().is_empty() {
                PLACEHOLDER_NAME.to_string()
            } else {
                name
            },
            avatar_url: avatar_url.filter(|url| !url.trim().is_empty()),
        }
    }

    /// True when this is the placeholder profile.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }

    /// Initials for this profile's name.
    pub fn initials(&self) -> String {
        initials(&self.name)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            avatar_url: None,
        }
    }
}

/// Derives up to two uppercase initials from a display name.
///
/// # Examples
///
/// ```
/// use woot_core::profile::initials;
///
/// assert_eq!(initials("John Doe"), "JD");
/// assert_eq!(initials("Jane"), "J");
/// assert_eq!(initials(""), "?");
/// ```
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    if letters.is_empty() {
        FALLBACK_INITIALS.to_string()
    } else {
        letters
    }
}

/// What the header is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStatus {
    Loading,
    Resolved,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Avatar {
    /// Remote image the host loads itself
    Image(String),
    Initials(String),
}

/// Header state observed by the host shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderState {
    pub status: HeaderStatus,
    pub title: String,
    pub avatar: Avatar,
}

impl HeaderState {
    /// Header shown before the profile resolves.
    pub fn loading() -> Self {
        Self {
            status: HeaderStatus::Loading,
            title: PLACEHOLDER_NAME.to_string(),
            avatar: Avatar::Initials(initials(PLACEHOLDER_NAME)),
        }
    }

    /// Header for a resolved profile.
    pub fn from_profile(profile: &Profile) -> Self {
        let status = if profile.is_placeholder() {
            HeaderStatus::Fallback
        } else {
            HeaderStatus::Resolved
        };
        let avatar = match &profile.avatar_url {
            Some(url) => Avatar::Image(url.clone()),
            None => Avatar::Initials(profile.initials()),
        };

        Self {
            status,
            title: profile.name.clone(),
            avatar,
        }
    }
}

impl Default for HeaderState {
    fn default() -> Self {
        Self::loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials() {
        assert_eq!(initials("John Doe"), "JD");
        assert_eq!(initials("Jane"), "J");
        assert_eq!(initials(""), FALLBACK_INITIALS);
        assert_eq!(initials("   "), FALLBACK_INITIALS);
        assert_eq!(initials("ada  byron lovelace"), "AB");
        assert_eq!(initials("émile zola"), "ÉZ");
    }

    #[test]
    fn test_blank_fields_fall_back() {
        let profile = Profile::new("  ", Some(String::new()));
        assert!(profile.is_placeholder());
    }

    #[test]
    fn test_header_from_profile_with_avatar() {
        let profile = Profile::new("John Doe", Some("https://cdn/a.png".to_string()));
        let header = HeaderState::from_profile(&profile);
        assert_eq!(header.status, HeaderStatus::Resolved);
        assert_eq!(header.title, "John Doe");
        assert_eq!(header.avatar, Avatar::Image("https://cdn/a.png".to_string()));
    }

    #[test]
    fn test_header_without_avatar_uses_initials() {
        let header = HeaderState::from_profile(&Profile::new("Jane", None));
        assert_eq!(header.avatar, Avatar::Initials("J".to_string()));
    }

    #[test]
    fn test_header_fallback() {
        let header = HeaderState::from_profile(&Profile::default());
        assert_eq!(header.status, HeaderStatus::Fallback);
        assert_eq!(header.title, PLACEHOLDER_NAME);
        assert_eq!(header.avatar, Avatar::Initials("CU".to_string()));
    }

    #[test]
    fn test_loading_header() {
        let header = HeaderState::loading();
        assert_eq!(header.status, HeaderStatus::Loading);
        assert_eq!(header.title, PLACEHOLDER_NAME);
    }
}
