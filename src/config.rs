//! # Service Configuration
//!
//! Everything the server needs at startup, read once and never reloaded.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! listen = "127.0.0.1:8080"
//! allowed_origins = ["https://app.example.com"]
//!
//! [auth]
//! jwt_secret = "a-long-random-string"
//! jwt_issuer = "itemvault"
//! jwt_expiry_minutes = 30
//! bcrypt_cost = 12
//!
//! [admin]
//! username = "admin"
//! password = "admin123"
//!
//! [login_limit]
//! max_attempts = 5
//! window_secs = 60
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration. Environment
//! variables prefixed with `ITEMVAULT_` override the file (see [`Config::apply_env_overrides`]).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub login_limit: LoginLimitConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Browser origins allowed to call the API. `"*"` allows any origin. The local
    /// frontend origins are always added.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn listen_port(&self) -> Option<u16> {
        self.listen.rsplit_once(':').and_then(|(_, port)| port.parse().ok())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Token signing and password hashing parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "default_jwt_expiry_minutes")]
    pub jwt_expiry_minutes: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.jwt_expiry_minutes.saturating_mul(60))
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_jwt_issuer(),
            jwt_expiry_minutes: default_jwt_expiry_minutes(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Bootstrap administrator, re-ensured on every start.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

/// Per-IP throttle on the login route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginLimitConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl LoginLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for LoginLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_secs: default_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedConfig {
    #[serde(default = "default_true")]
    pub welcome_item: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { welcome_item: true }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}
fn default_jwt_issuer() -> String {
    "itemvault".to_string()
}
fn default_jwt_expiry_minutes() -> u64 {
    60
}
fn default_bcrypt_cost() -> u32 {
    12
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_admin_password() -> String {
    "admin123".to_string()
}
fn default_max_attempts() -> u32 {
    5
}
fn default_window_secs() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Apply `ITEMVAULT_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any lookup. Empty values are ignored, and numbers that do not
    /// parse keep the current value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(listen) = get("ITEMVAULT_LISTEN") {
            self.server.listen = listen;
        }
        if let Some(raw) = get("ITEMVAULT_FRONTEND_ORIGINS") {
            self.server.allowed_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secret) = get("ITEMVAULT_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(issuer) = get("ITEMVAULT_JWT_ISSUER") {
            self.auth.jwt_issuer = issuer;
        }
        if let Some(raw) = get("ITEMVAULT_JWT_EXPIRY_MINUTES") {
            match raw.trim().parse() {
                Ok(minutes) => self.auth.jwt_expiry_minutes = minutes,
                Err(_) => tracing::warn!("Ignoring unparsable ITEMVAULT_JWT_EXPIRY_MINUTES '{}'", raw),
            }
        }
        if let Some(username) = get("ITEMVAULT_ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Some(password) = get("ITEMVAULT_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
    }
}

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.server.listen_port(), Some(8080));
        assert!(config.server.allowed_origins.is_empty());
        assert_eq!(config.auth.jwt_issuer, "itemvault");
        assert_eq!(config.auth.token_expiry(), Duration::from_secs(3600));
        assert!(config.auth.uses_default_secret());
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.login_limit.max_attempts, 5);
        assert_eq!(config.login_limit.window(), Duration::from_secs(60));
        assert!(config.seed.welcome_item);
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("itemvault.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[auth]\njwt_secret = 's3cret'\njwt_expiry_minutes = 5\n[seed]\nwelcome_item = false").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.token_expiry(), Duration::from_secs(300));
        assert!(!config.seed.welcome_item);
        // Defaults for missing fields
        assert_eq!(config.auth.jwt_issuer, "itemvault");
        assert_eq!(config.admin.password, "admin123");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ITEMVAULT_LISTEN", "127.0.0.1:9000"),
            ("ITEMVAULT_FRONTEND_ORIGINS", " https://a.example , ,https://b.example/"),
            ("ITEMVAULT_JWT_SECRET", "from-env"),
            ("ITEMVAULT_JWT_EXPIRY_MINUTES", "15"),
            ("ITEMVAULT_ADMIN_USERNAME", "root"),
            ("ITEMVAULT_ADMIN_PASSWORD", ""),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.server.listen, "127.0.0.1:9000");
        assert_eq!(config.server.listen_port(), Some(9000));
        assert_eq!(config.server.allowed_origins, vec!["https://a.example", "https://b.example/"]);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.auth.jwt_expiry_minutes, 15);
        assert_eq!(config.admin.username, "root");
        // Empty values are ignored
        assert_eq!(config.admin.password, "admin123");
    }

    #[test]
    fn test_bad_expiry_override_keeps_value() {
        let mut config = Config::default();
        config.auth.jwt_expiry_minutes = 42;
        config.apply_overrides(|key| (key == "ITEMVAULT_JWT_EXPIRY_MINUTES").then(|| "soon".to_string()));
        assert_eq!(config.auth.jwt_expiry_minutes, 42);
    }
}
