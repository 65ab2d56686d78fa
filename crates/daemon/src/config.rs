use std::net::SocketAddr;
use std::path::PathBuf;

use crate::settings::Settings;

#[derive(Debug)]
pub struct Config {
    /// Location of the persisted settings file (users, sessions,
    /// network defaults).
    pub settings_path: PathBuf,

    /// Listen address override; when unset the persisted settings (or
    /// their default) decide.
    pub listen_addr: Option<SocketAddr>,

    // logging
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            settings_path: Settings::default_path(),
            listen_addr: None,
            log_level: tracing::Level::INFO,
        }
    }
}
