//! Destination endpoints and the upload preset.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_UPLOAD_PRESET: &str = "photography_contest";

pub const DEFAULT_SCRIPT_URL: &str = "https://script.google.com/macros/s/AKfycbxwiVZPpThSVFXB0K4PJ7GrsINJRpqbADmelDHIsFDltZMGQXiopmj0C8Win3SvgIwa/exec";

const CLOUD_NAME_VAR: &str = "CLOUDINARY_CLOUD_NAME";
const UPLOAD_URL_VAR: &str = "CLOUDINARY_UPLOAD_URL";
const UPLOAD_PRESET_VAR: &str = "CLOUDINARY_UPLOAD_PRESET";
const SCRIPT_URL_VAR: &str = "SHEETS_SCRIPT_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Neither CLOUDINARY_CLOUD_NAME nor CLOUDINARY_UPLOAD_URL is set")]
    MissingCloudName,

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContestConfig {
    /// Full image upload endpoint of the media host.
    pub upload_url: String,
    #[serde(default = "default_preset")]
    pub upload_preset: String,
    /// Spreadsheet web app that appends one row per record.
    #[serde(default = "default_script_url")]
    pub script_url: String,
}

fn default_preset() -> String { DEFAULT_UPLOAD_PRESET.to_string() }
fn default_script_url() -> String { DEFAULT_SCRIPT_URL.to_string() }

pub fn cloudinary_upload_url(cloud_name: &str) -> String {
    format!("https://api.cloudinary.com/v1_1/{cloud_name}/image/upload")
}

impl ContestConfig {
    pub fn new(upload_url: impl Into<String>, script_url: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            upload_preset: default_preset(),
            script_url: script_url.into(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upload_url = match lookup(UPLOAD_URL_VAR) {
            Some(url) => url,
            None => {
                let cloud = lookup(CLOUD_NAME_VAR).ok_or(ConfigError::MissingCloudName)?;
                cloudinary_upload_url(&cloud)
            }
        };

        Ok(Self {
            upload_url,
            upload_preset: or_default(&lookup, UPLOAD_PRESET_VAR, DEFAULT_UPLOAD_PRESET),
            script_url: or_default(&lookup, SCRIPT_URL_VAR, DEFAULT_SCRIPT_URL),
        })
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

fn or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

/// Warn early when the configured preset is empty; the host rejects it anyway.
pub fn check_preset(config: &ContestConfig) {
    if config.upload_preset.trim().is_empty() {
        warn!("Upload preset is empty; uploads will be rejected by the media host");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_cloud_name_builds_upload_url() {
        let config = ContestConfig::from_lookup(lookup(&[(CLOUD_NAME_VAR, "demo")])).unwrap();
        assert_eq!(config.upload_url, "https://api.cloudinary.com/v1_1/demo/image/upload");
        assert_eq!(config.upload_preset, DEFAULT_UPLOAD_PRESET);
        assert_eq!(config.script_url, DEFAULT_SCRIPT_URL);
    }

    #[test]
    fn test_upload_url_override_wins() {
        let config = ContestConfig::from_lookup(lookup(&[
            (CLOUD_NAME_VAR, "demo"),
            (UPLOAD_URL_VAR, "http://127.0.0.1:9/upload"),
            (UPLOAD_PRESET_VAR, "custom"),
        ]))
        .unwrap();
        assert_eq!(config.upload_url, "http://127.0.0.1:9/upload");
        assert_eq!(config.upload_preset, "custom");
    }

    #[test]
    fn test_missing_cloud_name_is_error() {
        let err = ContestConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCloudName));
    }

    #[test]
    fn test_load_from_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contest.json");
        fs::write(&path, r#"{"uploadUrl": "http://localhost/upload"}"#).unwrap();

        let config = ContestConfig::load_from_file(&path).unwrap();
        assert_eq!(config.upload_url, "http://localhost/upload");
        assert_eq!(config.upload_preset, DEFAULT_UPLOAD_PRESET);
    }
}
