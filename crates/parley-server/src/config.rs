//! Configuration file management.
//!
//! The server reads `server.conf` from the working directory at
//! startup: a flat TOML key=value file. A missing file or missing keys
//! fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of the config file, resolved relative to the working directory.
pub const CONFIG_FILE: &str = "server.conf";

/// Complete server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// PEM certificate chain presented to clients.
    #[serde(default = "default_cert_path")]
    pub server_cert_path: String,
    /// PEM private key matching the certificate.
    #[serde(default = "default_key_path")]
    pub server_key_path: String,
    /// Passphrase seeding the at-rest message key.
    #[serde(default)]
    pub db_encryption_key: String,
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "data/parley.db".to_string()
}

fn default_cert_path() -> String {
    "server.crt".to_string()
}

fn default_key_path() -> String {
    "server.key".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_path: default_db_path(),
            server_cert_path: default_cert_path(),
            server_key_path: default_key_path(),
            db_encryption_key: String::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from [`CONFIG_FILE`] in the working directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ServerConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}
