use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

use crate::error::{ModerationError, Result};
use crate::tid::Tid;

/// Identifier of a content item (a post)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(Tid);

/// Identifier of a single community report
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Tid);

macro_rules! tid_backed {
    ($name:ident) => {
        impl $name {
            /// Allocate a fresh, time-ordered identifier
            pub fn generate() -> Self {
                Self(Tid::now())
            }

            /// Parse an identifier from its string form
            pub fn new(id: impl AsRef<str>) -> Result<Self> {
                Tid::new(id).map(Self)
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl FromStr for $name {
            type Err = ModerationError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

tid_backed!(ContentId);
tid_backed!(ReportId);

/// Opaque identifier of a platform account, assigned by the surrounding system
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(SmolStr);

impl UserId {
    /// Maximum accepted length of a user identifier
    pub const MAX_LEN: usize = 128;

    /// Validate and wrap a user identifier
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(ModerationError::validation(
                "user",
                "user id must not be empty",
            ));
        }
        if id.len() > Self::MAX_LEN {
            return Err(ModerationError::validation(
                "user",
                format!("user id longer than {} bytes", Self::MAX_LEN),
            ));
        }
        Ok(Self(SmolStr::new(id)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = SmolStr::deserialize(deserializer)?;
        Self::new(&value).map_err(D::Error::custom)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_parse_back() {
        let id = ContentId::generate();
        assert_eq!(ContentId::new(id.as_str()).unwrap(), id);
    }

    #[test]
    fn user_ids_are_trimmed_and_non_empty() {
        assert_eq!(UserId::new("  alice ").unwrap().as_str(), "alice");
        assert!(UserId::new("   ").is_err());
        assert!(UserId::new("x".repeat(UserId::MAX_LEN + 1)).is_err());
    }

    #[test]
    fn user_id_deserialize_validates() {
        let ok: UserId = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(ok.as_str(), "bob");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
