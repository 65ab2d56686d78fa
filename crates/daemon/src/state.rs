use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::SheetCache;
use crate::config::Config;
use crate::settings::{Settings, SettingsError};
use crate::store::CredentialStore;

/// Main service state - one cheap-clone handle over everything a
/// request handler needs.
#[derive(Clone)]
pub struct State {
    store: Arc<CredentialStore>,
    cache: SheetCache,
    settings_path: Arc<PathBuf>,
    listen_addr: SocketAddr,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // Loading validates defaults and prunes expired sessions before
        // any of the data is trusted.
        let settings = Settings::load(&config.settings_path)?;
        tracing::info!(
            path = %config.settings_path.display(),
            users = settings.users.len(),
            sessions = settings.sessions.len(),
            "settings loaded"
        );
        let listen_addr = config.listen_addr.unwrap_or(settings.listen_addr);
        let store = Arc::new(CredentialStore::from_parts(
            settings.users,
            settings.sessions,
        ));
        Ok(State {
            store,
            cache: SheetCache::new(),
            settings_path: Arc::new(config.settings_path.clone()),
            listen_addr,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// An owning handle on the store, for blocking tasks.
    pub fn store_handle(&self) -> Arc<CredentialStore> {
        self.store.clone()
    }

    pub fn cache(&self) -> &SheetCache {
        &self.cache
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Persist the current credential and session state. Prunes expired
    /// sessions, snapshots under the read lock, and writes with no lock
    /// held.
    pub async fn flush_settings(&self) -> Result<(), SettingsError> {
        self.store.prune_sessions();
        let (users, sessions) = self.store.snapshot();
        let listen_addr = self.listen_addr;
        let path = self.settings_path.as_ref().clone();
        tokio::task::spawn_blocking(move || {
            let mut settings = Settings {
                listen_addr,
                users,
                sessions,
            };
            settings.save(&path)
        })
        .await
        .map_err(|e| SettingsError::Io(std::io::Error::other(e)))?
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}
