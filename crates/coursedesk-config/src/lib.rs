//! Shared configuration for the Coursedesk CLI and TUI.
//!
//! TOML profiles, durable token storage (env override + system keyring),
//! and translation to `coursedesk_core::ClientConfig`. Both binaries
//! depend on this crate; the CLI layers its global flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use coursedesk_api::{Session, TokenStore};
use coursedesk_core::{ClientConfig, DEFAULT_PAGE_SIZE, FilterDiscipline, TlsVerification};

/// Service name under which tokens are kept in the system keyring.
pub const KEYRING_SERVICE: &str = "coursedesk";

/// Environment variable that overrides the stored token for one process.
pub const TOKEN_ENV: &str = "COURSEDESK_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("token storage failed: {0}")]
    TokenStorage(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<coursedesk_api::Error> for ConfigError {
    fn from(err: coursedesk_api::Error) -> Self {
        Self::TokenStorage(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: `requested`, else the configured default.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub filter_mode: FilterDiscipline,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            page_size: default_page_size(),
            filter_mode: FilterDiscipline::default(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_timeout() -> u64 {
    30
}

/// A named admin API profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://api.example.com").
    pub api_url: String,

    /// Rows per listing page.
    pub page_size: Option<u32>,

    /// `server` (default) or `client` filtering and sorting.
    pub filter_mode: Option<FilterDiscipline>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout, in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "coursedesk", "coursedesk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("coursedesk");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `COURSEDESK_*` variables
/// (nested keys separated by `__`, e.g. `COURSEDESK_DEFAULTS__PAGE_SIZE`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("COURSEDESK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token storage ───────────────────────────────────────────────────

/// Bearer token kept in the system keyring under `<profile>/token`.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    profile: String,
}

impl KeyringTokenStore {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, coursedesk_api::Error> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{}/token", self.profile))
            .map_err(|e| coursedesk_api::Error::TokenStorage(e.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>, coursedesk_api::Error> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(coursedesk_api::Error::TokenStorage(e.to_string())),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), coursedesk_api::Error> {
        self.entry()?
            .set_password(token.expose_secret())
            .map_err(|e| coursedesk_api::Error::TokenStorage(e.to_string()))
    }

    fn clear(&self) -> Result<(), coursedesk_api::Error> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(coursedesk_api::Error::TokenStorage(e.to_string())),
        }
    }
}

/// Open the session for `profile_name`.
///
/// `COURSEDESK_TOKEN` wins and is never persisted; otherwise the token is
/// read from the keyring.
pub fn open_session(profile_name: &str) -> Result<Session, ConfigError> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            debug!("using token from {TOKEN_ENV}");
            return Ok(Session::with_token(SecretString::from(token)));
        }
    }
    Ok(Session::new(KeyringTokenStore::new(profile_name))?)
}

// ── Profile → ClientConfig ──────────────────────────────────────────

/// Build a `ClientConfig` from a profile and the global defaults, with no
/// CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let base_url: url::Url = profile
        .api_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", profile.api_url),
        })?;

    let page_size = profile.page_size.unwrap_or(defaults.page_size);
    if page_size == 0 {
        return Err(ConfigError::Validation {
            field: "page_size".into(),
            reason: "must be at least 1".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ClientConfig {
        base_url,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        page_size,
        discipline: profile.filter_mode.unwrap_or(defaults.filter_mode),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
default_profile = "school"

[defaults]
page_size = 25

[profiles.school]
api_url = "https://api.school.test"
filter_mode = "client"
timeout = 5

[profiles.dev]
api_url = "https://localhost:8443"
insecure = true
page_size = 50
"#;

    fn sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles_over_defaults() {
        let config = sample();
        assert_eq!(config.profile_name(None), "school");
        assert_eq!(config.profile_name(Some("dev")), "dev");
        assert_eq!(config.defaults.page_size, 25);
        assert_eq!(config.defaults.output, "table");
        assert!(matches!(
            config.profile("nope"),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn profile_inherits_defaults() {
        let config = sample();
        let client = profile_to_client_config(config.profile("school").unwrap(), &config.defaults)
            .unwrap();
        assert_eq!(client.page_size, 25);
        assert_eq!(client.discipline, FilterDiscipline::Client);
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.tls, TlsVerification::SystemDefaults);

        let dev = profile_to_client_config(config.profile("dev").unwrap(), &config.defaults)
            .unwrap();
        assert_eq!(dev.page_size, 50);
        assert_eq!(dev.discipline, FilterDiscipline::Server);
        assert_eq!(dev.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_bad_profiles() {
        let defaults = Defaults::default();
        let bad_url = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_client_config(&bad_url, &defaults),
            Err(ConfigError::Validation { .. })
        ));

        let zero_page = Profile {
            api_url: "https://api.school.test".into(),
            page_size: Some(0),
            ..Profile::default()
        };
        assert!(profile_to_client_config(&zero_page, &defaults).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                api_url: "https://api.school.test".into(),
                ..Profile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("default").unwrap().api_url, "https://api.school.test");
    }
}
