//! Runtime settings
//!
//! Settings are read from `settings.toml` with the same two-layer resolution as
//! the pattern library: an explicit path, then the data dir override
//! (~/.local/share/momo/settings.toml). Missing keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Platform data directory for Momo overrides
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("momo"))
}

/// Default settings override path
pub fn default_settings_path() -> Option<PathBuf> {
    default_data_dir().map(|d| d.join("settings.toml"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Re-fetch and re-decide attempts after a balance update conflict
    pub max_conflict_retries: u32,
    /// Currency code shown next to amounts
    pub currency: String,
    /// Source label used when an imported row has none
    pub default_source: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            currency: "GHS".to_string(),
            default_source: None,
        }
    }
}

impl Settings {
    /// Load settings (explicit path, then data dir override, then defaults)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_settings_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                parse_settings(&content)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Raw settings structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawSettings {
    ingest: Option<RawIngest>,
    display: Option<RawDisplay>,
}

#[derive(Debug, Deserialize)]
struct RawIngest {
    max_conflict_retries: Option<u32>,
    default_source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDisplay {
    currency: Option<String>,
}

fn parse_settings(content: &str) -> Result<Settings> {
    let raw: RawSettings = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid settings TOML: {}", e)))?;

    let mut settings = Settings::default();

    if let Some(ingest) = raw.ingest {
        if let Some(retries) = ingest.max_conflict_retries {
            settings.max_conflict_retries = retries;
        }
        if let Some(source) = ingest.default_source.filter(|s| !s.trim().is_empty()) {
            settings.default_source = Some(source);
        }
    }

    if let Some(display) = raw.display {
        if let Some(currency) = display.currency {
            settings.currency = currency;
        }
    }

    Ok(settings)
}
