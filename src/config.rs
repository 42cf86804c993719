//! Client configuration: config dir, backend defaults, timeouts, token store.
//! Values come from config.json with environment overrides on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://10.16.135.0:4000";
pub const DEFAULT_BACKEND_PORT: u16 = 4000;
const DEFAULT_API_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const CONFIG_FILENAME: &str = "config.json";
const STATE_FILENAME: &str = "state.json";

const ENV_CONFIG_DIR: &str = "MOOORI_CONFIG_DIR";
const ENV_BACKEND_URL: &str = "MOOORI_BACKEND_URL";

/// Where the client runs; decides the loopback alias used to reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Web
        }
    }

    /// Host the backend is reachable at from this platform's emulator or browser.
    pub fn loopback_host(self) -> &'static str {
        match self {
            // emulator alias for the host machine's localhost
            Platform::Android => "10.0.2.2",
            Platform::Ios => "127.0.0.1",
            Platform::Web => "localhost",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    Keyring,
    File,
}

#[cfg(windows)]
const APP_DIR: &str = "MoooriAdmin";
#[cfg(not(windows))]
const APP_DIR: &str = "mooori-admin";

/// Trimmed value of `key`; unset and blank both read as absent.
fn env_var(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `~` and `~/...` resolve against the home directory.
fn home_relative(raw: &str) -> PathBuf {
    let rest = match raw {
        "~" => "",
        _ => match raw.strip_prefix("~/") {
            Some(rest) => rest,
            None => return PathBuf::from(raw),
        },
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

/// True when the config dir is overridden (test and sandbox runs).
pub fn config_dir_overridden() -> bool {
    env_var(ENV_CONFIG_DIR).is_some()
}

/// `MOOORI_CONFIG_DIR` when set, else the platform config dir
/// (`%APPDATA%`, `$XDG_CONFIG_HOME` or `~/.config`).
pub fn config_dir() -> PathBuf {
    match env_var(ENV_CONFIG_DIR) {
        Some(dir) => home_relative(&dir),
        None => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR),
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILENAME)
}

pub fn state_path() -> PathBuf {
    config_dir().join(STATE_FILENAME)
}

/// On-disk layout of config.json. Every field is optional.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_store: Option<TokenStoreKind>,
}

impl ConfigFile {
    /// Read a config file; missing or malformed files yield the defaults.
    pub fn read(path: &Path) -> Self {
        if !path.exists() {
            return ConfigFile::default();
        }
        match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config at {}: {}", path.display(), e);
                ConfigFile::default()
            }),
            Err(e) => {
                log::warn!("Could not read config at {}: {}", path.display(), e);
                ConfigFile::default()
            }
        }
    }

    /// Read-modify-write of the config file at `path`.
    pub fn update(path: &Path, update: impl FnOnce(&mut ConfigFile)) -> crate::Result<()> {
        let mut cfg = ConfigFile::read(path);
        update(&mut cfg);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&cfg)?)?;
        Ok(())
    }
}

/// Resolved settings used by the rest of the client.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend_url: String,
    pub backend_port: u16,
    pub platform: Platform,
    pub api_timeout: Duration,
    pub probe_timeout: Duration,
    pub token_store: TokenStoreKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from_file(ConfigFile::default(), None)
    }
}

impl AppConfig {
    /// Load config.json from the config dir and apply environment overrides.
    pub fn load() -> Self {
        let file = ConfigFile::read(&config_path());
        AppConfig::from_file(file, env_var(ENV_BACKEND_URL))
    }

    pub fn from_file(file: ConfigFile, url_override: Option<String>) -> Self {
        let backend_url = url_override
            .or(file.backend_url)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        AppConfig {
            backend_url,
            backend_port: file.backend_port.unwrap_or(DEFAULT_BACKEND_PORT),
            platform: file.platform.unwrap_or_else(Platform::current),
            api_timeout: Duration::from_secs(
                file.api_timeout_secs.unwrap_or(DEFAULT_API_TIMEOUT_SECS),
            ),
            probe_timeout: Duration::from_secs(
                file.probe_timeout_secs.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
            ),
            token_store: file.token_store.unwrap_or_default(),
        }
    }
}

/// Persist a new configured default backend URL.
pub fn set_backend_url(url: &str) -> crate::Result<()> {
    let url = url.trim().trim_end_matches('/').to_string();
    ConfigFile::update(&config_path(), |c| c.backend_url = Some(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let cfg = AppConfig::from_file(ConfigFile::default(), None);
        assert_eq!(cfg.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(cfg.backend_port, 4000);
        assert_eq!(cfg.api_timeout, Duration::from_secs(60));
        assert_eq!(cfg.probe_timeout, Duration::from_secs(5));
        assert_eq!(cfg.token_store, TokenStoreKind::Keyring);
    }

    #[test]
    fn env_override_beats_file_and_is_trimmed() {
        let file = ConfigFile {
            backend_url: Some("http://192.168.1.6:4000".into()),
            ..Default::default()
        };
        let cfg = AppConfig::from_file(file, Some(" http://10.0.0.5:4000/ ".into()));
        assert_eq!(cfg.backend_url, "http://10.0.0.5:4000");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let file = ConfigFile::read(&path);
        assert!(file.backend_url.is_none());
    }

    #[test]
    fn update_round_trips_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        ConfigFile::update(&path, |c| {
            c.backend_url = Some("http://192.168.0.42:4000".into());
            c.platform = Some(Platform::Android);
            c.token_store = Some(TokenStoreKind::File);
        })
        .unwrap();
        let cfg = AppConfig::from_file(ConfigFile::read(&path), None);
        assert_eq!(cfg.backend_url, "http://192.168.0.42:4000");
        assert_eq!(cfg.platform, Platform::Android);
        assert_eq!(cfg.token_store, TokenStoreKind::File);
    }

    #[test]
    fn config_dir_override_resolves_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(home_relative("~"), home);
        assert_eq!(home_relative("~/mooori/cfg"), home.join("mooori/cfg"));
        assert_eq!(home_relative("/srv/mooori"), PathBuf::from("/srv/mooori"));
        assert_eq!(home_relative("~other/cfg"), PathBuf::from("~other/cfg"));
    }

    #[test]
    fn platform_loopback_hosts() {
        assert_eq!(Platform::Android.loopback_host(), "10.0.2.2");
        assert_eq!(Platform::Ios.loopback_host(), "127.0.0.1");
        assert_eq!(Platform::Web.loopback_host(), "localhost");
    }
}
