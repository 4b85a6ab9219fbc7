use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_JIRADECK_CONFIG: &str = "JIRADECK_CONFIG";

const SETTINGS_FILE_NAME: &str = ".jiradeck_config.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0}")]
    Message(String),
}

impl SettingsError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Connection settings for one Jira site, stored as a JSON file in the
/// user's home directory. Absence of the file means "unconfigured".
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub project_name: String,
    pub user_name: String,
    pub api_key: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Settings")
            .field("project_name", &self.project_name)
            .field("user_name", &self.user_name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

pub fn load_from_env() -> Result<Option<Settings>, SettingsError> {
    let path = settings_path_from_env()?;
    load_from_path(path)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Option<Settings>, SettingsError> {
    let path = path.as_ref();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(SettingsError::configuration(format!(
                "Failed to read settings file {}: {err}",
                path.display()
            )))
        }
    };

    let settings = serde_json::from_str(&raw).map_err(|err| {
        SettingsError::configuration(format!(
            "Settings file {} is not valid JSON: {err}",
            path.display()
        ))
    })?;
    Ok(Some(settings))
}

pub fn save_to_env(settings: &Settings) -> Result<(), SettingsError> {
    let path = settings_path_from_env()?;
    save_to_path(settings, path)
}

pub fn save_to_path(settings: &Settings, path: impl AsRef<Path>) -> Result<(), SettingsError> {
    let path = path.as_ref();
    let rendered = serde_json::to_string_pretty(settings).map_err(|err| {
        SettingsError::configuration(format!("Failed to serialize settings: {err}"))
    })?;
    std::fs::write(path, rendered.as_bytes()).map_err(|err| {
        SettingsError::configuration(format!(
            "Failed to write settings file {}: {err}",
            path.display()
        ))
    })
}

pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    let home = resolve_home_dir().ok_or_else(|| {
        SettingsError::configuration("Unable to resolve home directory from HOME or USERPROFILE")
    })?;
    Ok(home.join(SETTINGS_FILE_NAME))
}

fn settings_path_from_env() -> Result<PathBuf, SettingsError> {
    match std::env::var(ENV_JIRADECK_CONFIG) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                default_settings_path()
            } else {
                Ok(raw.into())
            }
        }
        Err(std::env::VarError::NotPresent) => default_settings_path(),
        Err(_) => Err(SettingsError::configuration(
            "JIRADECK_CONFIG contained invalid UTF-8",
        )),
    }
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
