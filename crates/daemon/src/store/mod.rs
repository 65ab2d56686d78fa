mod session;
mod user;

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use time::OffsetDateTime;

pub use session::{Session, SessionToken, MAX_SESSION_DURATION, SESSION_GRACE_PERIOD};
pub use user::{hash_password, user_key, AccessGrant, User};

/// Owner of all user and session state.
///
/// One instance exists per server process, constructed from the persisted
/// settings at startup and handed to every component that needs it. A
/// single reader/writer lock covers both maps jointly: renaming a user
/// must atomically rewrite the owning key on that user's sessions, so
/// the two cannot be guarded separately. No I/O happens under the lock;
/// persistence works on snapshots.
#[derive(Debug, Default)]
pub struct CredentialStore {
    inner: RwLock<StoreData>,
}

#[derive(Debug, Default)]
struct StoreData {
    /// Users keyed by case-folded name.
    users: HashMap<String, User>,
    sessions: HashMap<SessionToken, Session>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        users: HashMap<String, User>,
        sessions: HashMap<SessionToken, Session>,
    ) -> Self {
        CredentialStore {
            inner: RwLock::new(StoreData { users, sessions }),
        }
    }

    /// Clone out the user and session maps for persistence.
    pub fn snapshot(&self) -> (HashMap<String, User>, HashMap<SessionToken, Session>) {
        let data = self.inner.read();
        (data.users.clone(), data.sessions.clone())
    }

    // --- users ---

    /// Add a user. Returns false (and changes nothing) when the
    /// case-folded name is already taken.
    pub fn create_user(&self, name: &str, password: &str) -> bool {
        let key = user_key(name);
        if key.is_empty() {
            return false;
        }
        let mut data = self.inner.write();
        if data.users.contains_key(&key) {
            return false;
        }
        data.users.insert(key, User::new(name.trim(), password));
        true
    }

    /// Delete a user along with every session they own.
    pub fn remove_user(&self, name: &str) {
        let key = user_key(name);
        let mut data = self.inner.write();
        if data.users.remove(&key).is_some() {
            data.sessions.retain(|_, session| session.user_key != key);
        }
    }

    /// Rename a user, rewriting the owning key on all of their sessions.
    /// Returns false when the old name is unknown or the new name is
    /// already taken by someone else.
    pub fn rename_user(&self, old: &str, new: &str) -> bool {
        let old_key = user_key(old);
        let new_key = user_key(new);
        if new_key.is_empty() {
            return false;
        }
        let mut data = self.inner.write();
        if old_key == new_key {
            // Only the display casing changes; sessions keep their key.
            return match data.users.get_mut(&old_key) {
                Some(user) => {
                    user.name = new.trim().to_string();
                    true
                }
                None => false,
            };
        }
        if data.users.contains_key(&new_key) {
            return false;
        }
        let Some(mut user) = data.users.remove(&old_key) else {
            return false;
        };
        user.name = new.trim().to_string();
        data.users.insert(new_key.clone(), user);
        for session in data.sessions.values_mut() {
            if session.user_key == old_key {
                session.user_key = new_key.clone();
            }
        }
        true
    }

    pub fn set_user_password(&self, name: &str, password: &str) -> bool {
        let key = user_key(name);
        let mut data = self.inner.write();
        match data.users.get_mut(&key) {
            Some(user) => {
                user.password = hash_password(password);
                true
            }
            None => false,
        }
    }

    /// Resolve a name to its stored display casing and password digest.
    pub fn lookup_user_name_and_password(&self, name: &str) -> Option<(String, String)> {
        let data = self.inner.read();
        data.users
            .get(&user_key(name))
            .map(|user| (user.name.clone(), user.password.clone()))
    }

    /// Copy out a user's access list, or None for an unknown user.
    pub fn access_list(&self, name: &str) -> Option<BTreeMap<String, AccessGrant>> {
        let data = self.inner.read();
        data.users
            .get(&user_key(name))
            .map(|user| user.access_list.clone())
    }

    /// Replace a user's access list wholesale. Returns false for an
    /// unknown user.
    pub fn set_access_list(&self, name: &str, list: BTreeMap<String, AccessGrant>) -> bool {
        let key = user_key(name);
        let mut data = self.inner.write();
        match data.users.get_mut(&key) {
            Some(user) => {
                user.access_list = list;
                true
            }
            None => false,
        }
    }

    pub fn user_names(&self) -> Vec<String> {
        let data = self.inner.read();
        let mut names: Vec<String> = data.users.values().map(|u| u.name.clone()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    // --- sessions ---

    /// Issue a fresh session for the named user.
    pub fn create_session(&self, name: &str) -> SessionToken {
        let token = SessionToken::generate();
        let session = Session::new(user_key(name), OffsetDateTime::now_utc());
        self.inner.write().sessions.insert(token.clone(), session);
        token
    }

    /// Resolve a token to the owning user's display name, touching the
    /// session's last-used stamp. Expired or orphaned sessions are
    /// evicted on sight.
    pub fn lookup_session(&self, token: &SessionToken) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        let mut data = self.inner.write();
        let Some(session) = data.sessions.get(token) else {
            return None;
        };
        if session.expired_at(now) {
            data.sessions.remove(token);
            return None;
        }
        let Some(name) = data.users.get(&session.user_key).map(|u| u.name.clone()) else {
            // The owning user is gone; the session dies with them.
            data.sessions.remove(token);
            return None;
        };
        if let Some(session) = data.sessions.get_mut(token) {
            session.last_used = now;
        }
        Some(name)
    }

    /// Explicit invalidation (logout).
    pub fn remove_session(&self, token: &SessionToken) {
        self.inner.write().sessions.remove(token);
    }

    /// Delete every currently-expired session. Returns the number swept.
    pub fn prune_sessions(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut data = self.inner.write();
        let before = data.sessions.len();
        data.sessions.retain(|_, session| !session.expired_at(now));
        before - data.sessions.len()
    }
}
