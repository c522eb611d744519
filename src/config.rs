//! Configuration management for RAX File Manager
//!
//! Everything here is read once at startup. Sources, lowest priority first:
//! built-in defaults, `config.toml` (optional), `RAX_FM_*` environment
//! variables, and finally the command line root override.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config";

/// Minimum length accepted for the cookie signing secret.
pub const MIN_COOKIE_SECRET_LEN: usize = 64;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the HTTP listener
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Directory every browse/upload/remove is confined to
    #[serde(default = "default_server_root")]
    pub server_root: String,

    /// JSON array of `{"name", "password"}` records
    #[serde(default = "default_users_file")]
    pub users_file: String,

    /// Secret for signing session cookies. A random key is generated
    /// when absent, so sessions do not survive a restart.
    #[serde(default)]
    pub cookie_secret: Option<String>,

    /// Maximum upload size in MB
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_server_root() -> String {
    "./files".to_string()
}

fn default_users_file() -> String {
    "users.json".to_string()
}

fn default_max_upload_size_mb() -> u64 {
    100
}

impl ServerConfig {
    /// Load configuration from `config_path` (or `./config.toml`) with
    /// environment overrides, then apply the command line root.
    pub fn load(
        config_path: Option<&str>,
        root_override: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = Config::builder()
            .add_source(File::with_name(path).required(config_path.is_some()))
            .add_source(
                Environment::with_prefix("RAX_FM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;
        if let Some(root) = root_override {
            config.server_root = root;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.http_port == 0 {
            return Err(config::ConfigError::Message("http_port cannot be 0".into()));
        }

        if self.server_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        if self.users_file.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "users_file cannot be empty".into(),
            ));
        }

        if self.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if let Some(secret) = &self.cookie_secret {
            if secret.len() < MIN_COOKIE_SECRET_LEN {
                return Err(config::ConfigError::Message(format!(
                    "cookie_secret must be at least {MIN_COOKIE_SECRET_LEN} bytes"
                )));
            }
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn http_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.http_port)
    }

    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    pub fn users_file_path(&self) -> PathBuf {
        PathBuf::from(&self.users_file)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            server_root: default_server_root(),
            users_file: default_users_file(),
            cookie_secret: None,
            max_upload_size_mb: default_max_upload_size_mb(),
        }
    }
}
