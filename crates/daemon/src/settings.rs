use std::collections::HashMap;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::{Session, SessionToken, User};

const DEFAULT_PORT: u16 = 8422;

/// Persisted server state: network configuration plus the user and
/// session maps, one JSON object on disk.
///
/// Loading always re-validates defaults and prunes expired sessions
/// before the data is used; saving does the same on the way out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Users keyed by case-folded name.
    #[serde(default)]
    pub users: HashMap<String, User>,
    /// Sessions keyed by opaque token.
    #[serde(default)]
    pub sessions: HashMap<SessionToken, Session>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT)
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listen_addr: default_listen_addr(),
            users: HashMap::new(),
            sessions: HashMap::new(),
        }
    }
}

impl Settings {
    /// Default on-disk location, under the user configuration directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetd")
            .join("settings.json")
    }

    /// Read settings from disk. A missing file yields the defaults, so
    /// first launch needs no setup step.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let mut settings = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice::<Settings>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(SettingsError::Io(e)),
        };
        settings.validate();
        Ok(settings)
    }

    /// Write settings to disk via a temporary file rename. Expired
    /// sessions never hit storage.
    pub fn save(&mut self, path: &Path) -> Result<(), SettingsError> {
        self.validate();
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            std::fs::create_dir_all(dir)?;
        }
        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| SettingsError::Io(e.error))?;
        Ok(())
    }

    /// Re-establish invariants: keys case-folded, sessions owned by a
    /// live user, expired sessions dropped.
    fn validate(&mut self) {
        let users = std::mem::take(&mut self.users);
        self.users = users
            .into_iter()
            .filter(|(_, user)| !user.name.trim().is_empty())
            .map(|(_, user)| (crate::store::user_key(&user.name), user))
            .collect();
        let now = OffsetDateTime::now_utc();
        self.sessions.retain(|_, session| {
            self.users.contains_key(&session.user_key) && !session.expired_at(now)
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Format(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::{user_key, Session, SessionToken, User};
    use std::time::Duration;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.listen_addr.port(), DEFAULT_PORT);
        assert!(settings.users.is_empty());
    }

    #[test]
    fn test_save_load_round_trip_revalidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        let alice = User::new("Alice", "pw");
        settings.users.insert(user_key("Alice"), alice);

        // One live session, one expired, one orphaned.
        let now = OffsetDateTime::now_utc();
        let live = SessionToken::generate();
        settings.sessions.insert(live.clone(), Session::new("alice", now));
        let expired = SessionToken::generate();
        let mut old = Session::new("alice", now - Duration::from_secs(48 * 60 * 60));
        old.last_used = old.issued;
        settings.sessions.insert(expired.clone(), old);
        let orphan = SessionToken::generate();
        settings.sessions.insert(orphan.clone(), Session::new("ghost", now));

        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();

        assert!(loaded.users.contains_key("alice"));
        assert!(loaded.sessions.contains_key(&live));
        assert!(!loaded.sessions.contains_key(&expired));
        assert!(!loaded.sessions.contains_key(&orphan));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Format(_))
        ));
    }
}
