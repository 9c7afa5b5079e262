//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.charla/config.toml` (user)
//! 3. `/etc/charla/config.toml` (system)
//!
//! With no file present the built-in defaults apply.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.charla/secrets.toml` (user, must be 0600)
//! 2. `/etc/charla/secrets.toml` (system, must be 0600)

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatch::DispatchConfig;
use crate::prompt::Persona;
use crate::providers::CredentialSource;
use crate::session::StoreConfig;
use crate::{CharlaError, Result};

const SYSTEM_DIR: &str = "/etc/charla";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub persona: Persona,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

/// In-memory session store limits.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Maximum live conversations (default: 10000).
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    /// Idle time before a conversation is dropped, in seconds (default: 3600).
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

fn default_max_sessions() -> u64 {
    10_000
}

fn default_idle_timeout() -> u64 {
    3600
}

impl SessionsConfig {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new()
            .max_sessions(self.max_sessions)
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.charla/config.toml`
    /// 3. `/etc/charla/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CharlaError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            CharlaError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` means no file anywhere.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(CharlaError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        let candidates = user_file("config.toml")
            .into_iter()
            .chain([Path::new(SYSTEM_DIR).join("config.toml")]);
        Ok(candidates.into_iter().find(|p| p.exists()))
    }
}

fn user_file(name: &str) -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".charla").join(name))
}

/// Provider credentials keyed by the catalog's credential reference names.
///
/// ```toml
/// OPENAI_API_KEY = "sk-..."
/// CEREBRAS_API_KEY = "csk-..."
/// ```
///
/// Keys not present in the file fall back to the environment variable of the
/// same name.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Secrets {
    values: HashMap<String, String>,
}

// Never print secret values.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Secrets").field("keys", &keys).finish()
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.charla/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/charla/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (lookups use env vars).
    pub fn load() -> Result<Self> {
        if let Some(user_secrets) = user_file("secrets.toml")
            && user_secrets.exists()
        {
            return Self::load_from_file(&user_secrets);
        }

        let system_secrets = Path::new(SYSTEM_DIR).join("secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load one secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            CharlaError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            CharlaError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            CharlaError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(CharlaError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Value from the secrets file only.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl CredentialSource for Secrets {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::to_string)
            .or_else(|| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert!(config.dispatch.forced_provider.is_none());
        assert_eq!(config.dispatch.fallback_attempts, 3);
        assert_eq!(config.dispatch.history_window, 6);
        assert_eq!(config.persona.country, "Colombia");
        assert_eq!(config.sessions.max_sessions, 10_000);
        assert_eq!(config.sessions.idle_timeout_secs, 3600);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
            [dispatch]
            forced_provider = "cerebras"

            [persona]
            country = "México"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.dispatch.forced_provider.as_deref(), Some("cerebras"));
        // Defaults preserved
        assert_eq!(config.dispatch.fallback_attempts, 3);
        assert_eq!(config.persona.country, "México");
        assert_eq!(config.persona.tone, "colombiano");
    }

    #[test]
    fn sessions_config_builds_store_config() {
        let toml = r#"
            [sessions]
            max_sessions = 50
            idle_timeout_secs = 120
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let store = config.sessions.store_config();
        assert_eq!(store.max_sessions, 50);
        assert_eq!(store.idle_timeout, Duration::from_secs(120));
    }

    #[test]
    fn parse_flat_secrets() {
        let toml = r#"
            OPENAI_API_KEY = "sk-test"
            GEMINI_API_KEY = "g-test"
        "#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.get("OPENAI_API_KEY"), Some("sk-test"));
        assert_eq!(secrets.get("GITHUB_TOKEN"), None);
    }

    #[test]
    fn secrets_file_takes_precedence() {
        let mut secrets = Secrets::default();
        secrets.insert("CHARLA_TEST_FILE_KEY", "from-file");
        assert_eq!(
            secrets.lookup("CHARLA_TEST_FILE_KEY"),
            Some("from-file".to_string())
        );
        assert_eq!(secrets.lookup("CHARLA_TEST_SURELY_UNSET_KEY"), None);
    }

    #[test]
    fn debug_hides_values() {
        let mut secrets = Secrets::default();
        secrets.insert("OPENAI_API_KEY", "sk-very-secret");
        let printed = format!("{secrets:?}");
        assert!(printed.contains("OPENAI_API_KEY"));
        assert!(!printed.contains("sk-very-secret"));
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }
}
