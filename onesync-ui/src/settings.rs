use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use onesync_core::{Credentials, DisplayZone, remote_file_url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const CONFIG_ENV: &str = "ONESYNC_CONFIG";
const DISPLAY_ZONE_ENV: &str = "ONESYNC_DISPLAY_ZONE";
const CONFIG_DIR_NAME: &str = "onesync";
const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_WEBDAV_URL: &str = "https://webdav.yandex.ru/";
const DEFAULT_WEBDAV_FOLDER: &str = "/Tabby";
const DEFAULT_NAME_OF_FILE: &str = "config.yaml";

/// Keys of the `[WebDAV]` table, in form order.
pub const SETTING_KEYS: [&str; 7] = [
    "webdav_url",
    "webdav_folder",
    "username",
    "password",
    "path_to_file",
    "name_of_file",
    "destination_folder",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub webdav_url: String,
    pub webdav_folder: String,
    pub username: String,
    pub password: String,
    pub path_to_file: String,
    pub name_of_file: String,
    pub destination_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webdav_url: DEFAULT_WEBDAV_URL.to_string(),
            webdav_folder: DEFAULT_WEBDAV_FOLDER.to_string(),
            username: String::new(),
            password: String::new(),
            path_to_file: String::new(),
            name_of_file: DEFAULT_NAME_OF_FILE.to_string(),
            destination_folder: String::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(rename = "WebDAV", default)]
    webdav: Settings,
}

/// Values derived from [`Settings`]. Never persisted; rebuild with
/// [`Settings::target`] after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub server_url: String,
    pub remote_file_url: String,
    pub credentials: Credentials,
    pub local_sync_path: PathBuf,
    pub name_of_file: String,
    pub destination_folder: PathBuf,
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "webdav_url" => &self.webdav_url,
            "webdav_folder" => &self.webdav_folder,
            "username" => &self.username,
            "password" => &self.password,
            "path_to_file" => &self.path_to_file,
            "name_of_file" => &self.name_of_file,
            "destination_folder" => &self.destination_folder,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let slot = match key {
            "webdav_url" => &mut self.webdav_url,
            "webdav_folder" => &mut self.webdav_folder,
            "username" => &mut self.username,
            "password" => &mut self.password,
            "path_to_file" => &mut self.path_to_file,
            "name_of_file" => &mut self.name_of_file,
            "destination_folder" => &mut self.destination_folder,
            other => anyhow::bail!(
                "unknown setting: {other} (expected one of {})",
                SETTING_KEYS.join(", ")
            ),
        };
        *slot = value.into();
        Ok(())
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        SETTING_KEYS
            .iter()
            .map(|key| (*key, self.get(key).unwrap_or_default().to_string()))
            .collect()
    }

    /// Form label for a key: `webdav_url` becomes `Webdav Url`.
    pub fn label(key: &str) -> String {
        key.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                chars
                    .next()
                    .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn target(&self) -> SyncTarget {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        SyncTarget {
            server_url: self.webdav_url.clone(),
            remote_file_url: remote_file_url(
                &self.webdav_url,
                &self.webdav_folder,
                &self.name_of_file,
            ),
            credentials: Credentials::new(&self.username, &self.password),
            local_sync_path: expand_with_home(&self.path_to_file, &home).join(&self.name_of_file),
            name_of_file: self.name_of_file.clone(),
            destination_folder: expand_with_home(&self.destination_folder, &home),
        }
    }

    /// Copy safe to print: a non-empty password is replaced with `***`.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = "***".to_string();
        }
        copy
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub config_path: String,
    pub local_sync_path: String,
    pub remote_file_url: String,
    pub display_zone: String,
    pub webdav: Settings,
}

impl SettingsSnapshot {
    pub fn new(store: &ConfigStore, settings: &Settings, zone: &DisplayZone) -> Self {
        let target = settings.target();
        Self {
            config_path: store.path().display().to_string(),
            local_sync_path: target.local_sync_path.display().to_string(),
            remote_file_url: target.remote_file_url,
            display_zone: zone.describe(),
            webdav: settings.redacted(),
        }
    }
}

/// Reads and writes the `[WebDAV]` settings file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$ONESYNC_CONFIG`, else the per-user config directory.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: anything unreadable degrades to defaults.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %self.path.display(), error = ?err, "Failed to load configuration, using defaults");
                Settings::default()
            }
        }
    }

    fn try_load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Configuration file not found, using defaults");
            return Ok(Settings::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let file: SettingsFile = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        info!(path = %self.path.display(), "Loaded configuration");
        Ok(file.webdav)
    }

    /// Overwrites the whole file with all seven keys.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = SettingsFile {
            webdav: settings.clone(),
        };
        let contents = toml::to_string_pretty(&file).context("failed to encode configuration")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        info!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }
}

/// `$ONESYNC_DISPLAY_ZONE` (IANA name or `+HH:MM`), else Europe/Moscow.
pub fn display_zone_from_env() -> DisplayZone {
    display_zone_from(std::env::var(DISPLAY_ZONE_ENV).ok().as_deref())
}

fn display_zone_from(value: Option<&str>) -> DisplayZone {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => DisplayZone::parse(value).unwrap_or_else(|| {
            warn!(
                value = %value,
                "Ignoring invalid {DISPLAY_ZONE_ENV}, expected a zone name or +HH:MM"
            );
            DisplayZone::default()
        }),
        None => DisplayZone::default(),
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|base| base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

fn expand_with_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}
