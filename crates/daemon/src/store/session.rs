use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;
use uuid::Uuid;

/// Maximum length of time a session may exist without regard to use.
pub const MAX_SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// How long a session may sit idle past its maximum duration.
pub const SESSION_GRACE_PERIOD: Duration = Duration::from_secs(30 * 60);

const TOKEN_KIND_TAG: char = 'S';

/// Opaque, kind-tagged session token: the tag character followed by
/// 32 hex digits of v4 UUID randomness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        SessionToken(format!("{TOKEN_KIND_TAG}{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("not a session token")]
pub struct ParseTokenError;

impl FromStr for SessionToken {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(TOKEN_KIND_TAG).ok_or(ParseTokenError)?;
        if rest.len() != 32 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseTokenError);
        }
        Ok(SessionToken(s.to_string()))
    }
}

impl Serialize for SessionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

/// One live login. Owned by exactly one user via its case-folded key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_used: OffsetDateTime,
}

impl Session {
    pub fn new(user_key: impl Into<String>, now: OffsetDateTime) -> Self {
        Session {
            user_key: user_key.into(),
            issued: now,
            last_used: now,
        }
    }

    /// A session expires only once BOTH its maximum duration has passed
    /// since issue AND its grace period has passed since last use, so
    /// continuous use keeps it alive indefinitely.
    pub fn expired_at(&self, now: OffsetDateTime) -> bool {
        now - self.issued > MAX_SESSION_DURATION && now - self.last_used > SESSION_GRACE_PERIOD
    }
}
