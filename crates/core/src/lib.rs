pub mod config;
pub mod telemetry;

pub use config::{AppConfig, AuthConfig, SeedConfig, ServerConfig, SettingsError, StorageConfig};
