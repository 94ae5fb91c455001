use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix for environment overrides, e.g. `USERDIR_AUTH__JWT_SECRET`.
pub const ENV_PREFIX: &str = "USERDIR";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub seed: Option<SeedConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_seconds: i64,
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where user records live. Without a path the directory is in-memory.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

/// Bootstrap admin account created on startup when its email is unused.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub admin_email: String,
    pub admin_password: String,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

fn default_token_expiry() -> i64 {
    3600 // 1 hour
}

// Argon2 recommended parameters (19 MiB, 2 passes, 1 lane).
fn default_hash_memory_kib() -> u32 {
    19 * 1024
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_hash_parallelism() -> u32 {
    1
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Load `userdir.toml` from the current directory (optional) with
    /// environment variable overrides.
    ///
    /// Environment variables are prefixed with `USERDIR_` and use `__` between
    /// section and key, e.g. `USERDIR_AUTH__JWT_SECRET`, `USERDIR_SERVER__PORT`.
    ///
    /// Returns the config and the list of keys overridden from the environment.
    pub fn load_with_env() -> Result<(Self, Vec<String>), SettingsError> {
        Self::load_from("userdir", Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(file: &str, env: Environment) -> Result<(Self, Vec<String>), SettingsError> {
        let config = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?;

        // Detect which values were overridden by environment
        let env_vars = [
            ("USERDIR_AUTH__JWT_SECRET", "auth.jwt_secret"),
            ("USERDIR_AUTH__TOKEN_EXPIRY_SECONDS", "auth.token_expiry_seconds"),
            ("USERDIR_AUTH__HASH_MEMORY_KIB", "auth.hash_memory_kib"),
            ("USERDIR_AUTH__HASH_ITERATIONS", "auth.hash_iterations"),
            ("USERDIR_AUTH__HASH_PARALLELISM", "auth.hash_parallelism"),
            ("USERDIR_SERVER__HOST", "server.host"),
            ("USERDIR_SERVER__PORT", "server.port"),
            ("USERDIR_STORAGE__PATH", "storage.path"),
        ];
        let overrides = env_vars
            .iter()
            .filter(|(env_var, _)| std::env::var(env_var).is_ok())
            .map(|(_, key)| key.to_string())
            .collect();

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok((app_config, overrides))
    }

    /// Reject settings the server must not start with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(SettingsError::Invalid("auth.jwt_secret must not be empty".to_string()));
        }
        if self.auth.token_expiry_seconds <= 0 {
            return Err(SettingsError::Invalid(format!(
                "auth.token_expiry_seconds must be positive, got {}",
                self.auth.token_expiry_seconds
            )));
        }
        if let Some(seed) = &self.seed {
            if seed.admin_email.is_empty() || seed.admin_password.is_empty() {
                return Err(SettingsError::Invalid(
                    "seed.admin_email and seed.admin_password are both required".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
