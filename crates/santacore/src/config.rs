//! Process configuration read from environment variables.
//!
//! Both bot tokens and the administrator id are mandatory; startup fails hard
//! if any of them is absent. Everything else has a default.

use secrecy::SecretString;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DATABASE_PATH: &str = "santa.db";
pub const DEFAULT_LOG_FILE_PATH: &str = "santa.log";

/// Configuration errors, all fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Write {0} in the environment variables.")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Configuration for both bots.
#[derive(Debug)]
pub struct Config {
    /// Token of the participant-facing bot (`BOT_TOKEN_1`)
    pub user_bot_token: SecretString,
    /// Token of the admin-facing bot (`BOT_TOKEN_2`)
    pub admin_bot_token: SecretString,
    /// Telegram id of the only user allowed into the admin bot (`ADMIN_ID`)
    pub admin_id: u64,
    /// SQLite database file (`DATABASE_PATH`)
    pub database_path: String,
    /// Log file (`LOG_FILE_PATH`)
    pub log_file_path: String,
    /// Custom Bot API server (`BOT_API_URL`)
    pub bot_api_url: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let user_bot_token = required("BOT_TOKEN_1")?;
        let admin_bot_token = required("BOT_TOKEN_2")?;
        let admin_id_raw = required("ADMIN_ID")?;
        // Telegram user ids are positive; negative ones belong to groups and channels
        let admin_id = admin_id_raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ConfigError::Invalid {
                key: "ADMIN_ID",
                reason: format!("{:?} is not a positive Telegram user id", admin_id_raw),
            })?;

        let database_path = lookup("DATABASE_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let log_file_path = lookup("LOG_FILE_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string());
        let bot_api_url = lookup("BOT_API_URL").filter(|v| !v.trim().is_empty());

        Ok(Self {
            user_bot_token: SecretString::from(user_bot_token),
            admin_bot_token: SecretString::from(admin_bot_token),
            admin_id,
            database_path,
            log_file_path,
            bot_api_url,
        })
    }
}

fn optional_from_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Database path for commands that do not need bot credentials (`migrate`, `export`).
pub fn database_path_from_env() -> String {
    optional_from_env("DATABASE_PATH", DEFAULT_DATABASE_PATH)
}

/// Log file path, known before the rest of the configuration is validated.
pub fn log_file_path_from_env() -> String {
    optional_from_env("LOG_FILE_PATH", DEFAULT_LOG_FILE_PATH)
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for Bot API requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// SQLite busy timeout for pooled connections (in seconds)
    pub const DB_BUSY_TIMEOUT_SECS: u64 = 5;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    pub fn db_busy_timeout() -> Duration {
        Duration::from_secs(DB_BUSY_TIMEOUT_SECS)
    }
}

/// Limits on collected answers
pub mod limits {
    /// Max characters for name, address and comment
    pub const MAX_TEXT_CHARS: usize = 512;

    /// Max characters for the phone number (column used to be VARCHAR(32))
    pub const MAX_PHONE_CHARS: usize = 32;
}

/// Admin panel configuration
pub mod admin_panel {
    /// Participants per page in the admin list
    pub const PAGE_SIZE: usize = 8;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const FULL: &[(&str, &str)] = &[("BOT_TOKEN_1", "111:user"), ("BOT_TOKEN_2", "222:admin"), ("ADMIN_ID", "42")];

    #[test]
    fn test_config_loads_required_values_and_defaults() {
        let config = Config::from_lookup(lookup_from(FULL)).unwrap();

        assert_eq!(config.user_bot_token.expose_secret(), "111:user");
        assert_eq!(config.admin_bot_token.expose_secret(), "222:admin");
        assert_eq!(config.admin_id, 42);
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.log_file_path, DEFAULT_LOG_FILE_PATH);
        assert!(config.bot_api_url.is_none());
    }

    #[test]
    fn test_config_fails_on_each_missing_required_key() {
        for missing in ["BOT_TOKEN_1", "BOT_TOKEN_2", "ADMIN_ID"] {
            let pairs: Vec<(&str, &str)> = FULL.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(matches!(err, ConfigError::Missing(key) if key == missing));
            assert_eq!(err.to_string(), format!("Write {} in the environment variables.", missing));
        }
    }

    #[test]
    fn test_config_rejects_non_numeric_admin_id() {
        for bad in ["@santa", "-42", "-1001234567890", "0"] {
            let err = Config::from_lookup(lookup_from(&[
                ("BOT_TOKEN_1", "a"),
                ("BOT_TOKEN_2", "b"),
                ("ADMIN_ID", bad),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "ADMIN_ID", .. }), "{} was accepted", bad);
        }
    }

    #[test]
    fn test_config_optional_overrides() {
        let mut pairs = FULL.to_vec();
        pairs.push(("DATABASE_PATH", "/data/santa.sqlite"));
        pairs.push(("BOT_API_URL", "http://localhost:8081"));
        pairs.push(("LOG_FILE_PATH", ""));

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.database_path, "/data/santa.sqlite");
        assert_eq!(config.bot_api_url.as_deref(), Some("http://localhost:8081"));
        assert_eq!(config.log_file_path, DEFAULT_LOG_FILE_PATH);
    }

    #[test]
    fn test_config_debug_does_not_leak_tokens() {
        let config = Config::from_lookup(lookup_from(FULL)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("111:user"));
        assert!(!debug.contains("222:admin"));
    }
}
