// Service modules (daemon functionality)
pub mod cache;
pub mod cli;
pub mod fields;
pub mod http_server;
pub mod listing;
pub mod process;
pub mod settings;
pub mod store;

// App state (configuration, wiring)
pub mod config;
pub mod state;

// Re-exports for consumers
pub use config::Config;
pub use process::spawn_service;
pub use state::State;
