use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Application-wide salt mixed into every password digest. Changing it
/// invalidates every stored credential.
const PASSWORD_SALT: &str = "sheetd:v1";

/// Case-folded lookup key for a user name.
pub fn user_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Deterministic salted digest of a password. Verification is digest
/// equality; the original password is never recoverable or stored.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(PASSWORD_SALT.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Grants access to documents under one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub dir: PathBuf,
    #[serde(default)]
    pub read_only: bool,
}

/// A server account. Stored in the settings file keyed by [`user_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name, preserving the caller's original casing.
    pub name: String,
    /// Hex-encoded password digest.
    pub password: String,
    /// Access-control list: user-chosen label to grant.
    #[serde(default)]
    pub access_list: BTreeMap<String, AccessGrant>,
}

impl User {
    pub fn new(name: impl Into<String>, password: &str) -> Self {
        User {
            name: name.into(),
            password: hash_password(password),
            access_list: BTreeMap::new(),
        }
    }
}
