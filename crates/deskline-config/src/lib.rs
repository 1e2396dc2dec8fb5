use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_DESKLINE_CONFIG: &str = "DESKLINE_CONFIG";

const DEFAULT_BACKEND_PROVIDER: &str = "http";
const DEFAULT_API_URL: &str = "https://api-osius.up.railway.app";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_WS_URL: &str = "wss://api-osius.up.railway.app/ws";
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 3;
const DEFAULT_NOTICE_TTL_SECS: u64 = 4;
const DEFAULT_DESCRIPTION_PREVIEW_LINES: u16 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<ConfigError> for deskline_domain::CoreError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendProviderKind {
    Http,
    Demo,
}

impl BackendProviderKind {
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Demo => "demo",
        }
    }

    pub fn from_key(provider_key: &str) -> Option<Self> {
        match provider_key {
            "http" => Some(Self::Http),
            "demo" => Some(Self::Demo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesklineConfig {
    #[serde(default)]
    pub backend: BackendConfigToml,
    #[serde(default)]
    pub live: LiveConfigToml,
    #[serde(default)]
    pub session: SessionConfigToml,
    #[serde(default)]
    pub ui: UiConfigToml,
}

impl Default for DesklineConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfigToml::default(),
            live: LiveConfigToml::default(),
            session: SessionConfigToml::default(),
            ui: UiConfigToml::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfigToml {
    #[serde(default = "default_backend_provider")]
    pub provider: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfigToml {
    fn default() -> Self {
        Self {
            provider: default_backend_provider(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveConfigToml {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl Default for LiveConfigToml {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfigToml {
    #[serde(default = "default_session_store_path")]
    pub store_path: String,
}

impl Default for SessionConfigToml {
    fn default() -> Self {
        Self {
            store_path: default_session_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiConfigToml {
    #[serde(default = "default_notice_ttl_secs")]
    pub notice_ttl_secs: u64,
    #[serde(default = "default_description_preview_lines")]
    pub description_preview_lines: u16,
}

impl Default for UiConfigToml {
    fn default() -> Self {
        Self {
            notice_ttl_secs: default_notice_ttl_secs(),
            description_preview_lines: default_description_preview_lines(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRuntimeConfig {
    pub provider: BackendProviderKind,
    pub api_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRuntimeConfig {
    pub ws_url: String,
    pub reconnect_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiViewConfig {
    pub notice_ttl: Duration,
    pub description_preview_lines: u16,
}

impl DesklineConfig {
    pub fn backend_runtime(&self) -> Result<BackendRuntimeConfig, ConfigError> {
        let provider = BackendProviderKind::from_key(self.backend.provider.trim()).ok_or_else(
            || {
                ConfigError::configuration(format!(
                    "backend.provider `{}` is not recognized; expected `http` or `demo`",
                    self.backend.provider
                ))
            },
        )?;
        Ok(BackendRuntimeConfig {
            provider,
            api_url: self.backend.api_url.clone(),
            request_timeout: Duration::from_secs(self.backend.request_timeout_secs),
        })
    }

    pub fn live_runtime(&self) -> LiveRuntimeConfig {
        LiveRuntimeConfig {
            ws_url: self.live.ws_url.clone(),
            reconnect_delay: Duration::from_secs(self.live.reconnect_delay_secs),
        }
    }

    pub fn session_store_path(&self) -> PathBuf {
        PathBuf::from(&self.session.store_path)
    }

    pub fn ui_view(&self) -> UiViewConfig {
        UiViewConfig {
            notice_ttl: Duration::from_secs(self.ui.notice_ttl_secs),
            description_preview_lines: self.ui.description_preview_lines,
        }
    }
}

pub fn load_from_env() -> Result<DesklineConfig, ConfigError> {
    let path = config_path_from_env()?;
    load_from_path(path)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<DesklineConfig, ConfigError> {
    load_or_create_config(path.as_ref())
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = resolve_home_dir().ok_or_else(|| {
        ConfigError::configuration("Unable to resolve home directory from HOME or USERPROFILE")
    })?;

    Ok(home.join(".config").join("deskline").join("config.toml"))
}

fn config_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(ENV_DESKLINE_CONFIG) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                default_config_path()
            } else {
                Ok(raw.into())
            }
        }
        Err(std::env::VarError::NotPresent) => default_config_path(),
        Err(_) => Err(ConfigError::configuration(
            "DESKLINE_CONFIG contained invalid UTF-8",
        )),
    }
}

pub fn default_deskline_data_dir() -> PathBuf {
    resolve_data_local_dir().join("deskline")
}

fn resolve_data_local_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(path) = std::env::var("LOCALAPPDATA") {
            let path = path.trim();
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(home) = resolve_home_dir() {
            return home.join("AppData").join("Local");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = resolve_home_dir() {
            return home.join("Library").join("Application Support");
        }
    }

    #[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
    {
        if let Ok(path) = std::env::var("XDG_DATA_HOME") {
            let path = path.trim();
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(home) = resolve_home_dir() {
            return home.join(".local").join("share");
        }
    }

    std::env::temp_dir()
}

fn resolve_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("USERPROFILE")
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
}

fn default_backend_provider() -> String {
    DEFAULT_BACKEND_PROVIDER.to_owned()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_owned()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_owned()
}

fn default_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY_SECS
}

fn default_session_store_path() -> String {
    default_deskline_data_dir()
        .join("session.db")
        .to_string_lossy()
        .to_string()
}

fn default_notice_ttl_secs() -> u64 {
    DEFAULT_NOTICE_TTL_SECS
}

fn default_description_preview_lines() -> u16 {
    DEFAULT_DESCRIPTION_PREVIEW_LINES
}

fn persist_config(path: &Path, config: &DesklineConfig) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(config).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to serialize DESKLINE_CONFIG for {}: {err}",
            path.display()
        ))
    })?;

    std::fs::write(path, rendered.as_bytes()).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to write DESKLINE_CONFIG to {}: {err}",
            path.display()
        ))
    })
}

fn load_or_create_config(path: &Path) -> Result<DesklineConfig, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        ConfigError::configuration(format!(
                            "Failed to create parent directory {} for DESKLINE_CONFIG: {err}",
                            parent.display()
                        ))
                    })?;
                }
            }

            let default_config = DesklineConfig::default();
            persist_config(path, &default_config)?;

            toml::to_string_pretty(&default_config).map_err(|err| {
                ConfigError::configuration(format!(
                    "Failed to serialize default DESKLINE_CONFIG: {err}"
                ))
            })?
        }
        Err(err) => {
            return Err(ConfigError::configuration(format!(
                "Failed to read DESKLINE_CONFIG from {}: {err}",
                path.display()
            )));
        }
    };

    let mut config: DesklineConfig = toml::from_str(&raw).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to parse DESKLINE_CONFIG from {}: {err}",
            path.display()
        ))
    })?;

    let changed = normalize_config(&mut config)?;
    if changed {
        persist_config(path, &config)?;
    }

    // Surface a bad provider at load time instead of first use.
    config.backend_runtime()?;

    Ok(config)
}

fn normalize_config(config: &mut DesklineConfig) -> Result<bool, ConfigError> {
    let mut changed = false;

    changed |= normalize_non_empty_string(&mut config.backend.provider, default_backend_provider());
    changed |= normalize_non_empty_string(&mut config.backend.api_url, default_api_url());
    if config.backend.request_timeout_secs == 0 {
        config.backend.request_timeout_secs = default_request_timeout_secs();
        changed = true;
    }

    changed |= normalize_non_empty_string(&mut config.live.ws_url, default_ws_url());
    if config.live.reconnect_delay_secs == 0 {
        config.live.reconnect_delay_secs = default_reconnect_delay_secs();
        changed = true;
    }

    changed |=
        normalize_non_empty_string(&mut config.session.store_path, default_session_store_path());

    if config.ui.notice_ttl_secs == 0 {
        config.ui.notice_ttl_secs = default_notice_ttl_secs();
        changed = true;
    }
    if config.ui.description_preview_lines == 0 {
        config.ui.description_preview_lines = default_description_preview_lines();
        changed = true;
    }

    Ok(changed)
}

fn normalize_non_empty_string(value: &mut String, fallback: String) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        *value = fallback;
        return true;
    }
    if trimmed != value {
        *value = trimmed.to_owned();
        return true;
    }
    false
}
