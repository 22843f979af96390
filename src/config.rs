//! TOML configuration for stage instances.
//!
//! A configuration file holds one table per component name. Each stage
//! pulls the table named by its config key and deserialises it into a typed
//! section; keys a section does not know about are ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;

pub const DEFAULT_BLUR: u32 = 2;
pub const MAX_BLUR: i64 = 50;
pub const DEFAULT_DIFF_THRESHOLD: u16 = 15;
pub const MAX_DIFF_THRESHOLD: i64 = 256;

/// Parsed configuration file
#[derive(Debug, Clone)]
pub struct StageConfig {
    path: PathBuf,
    table: toml::Table,
}

impl StageConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parse configuration text; `path` is only used in error messages
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self, ConfigError> {
        let path = path.into();
        let table = toml::from_str::<toml::Table>(text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, table })
    }

    /// Deserialise the table named `key`. A missing table is fatal.
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self
            .table
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingSection {
                key: key.to_string(),
                path: self.path.clone(),
            })?;

        value.try_into().map_err(|source| ConfigError::Malformed {
            key: key.to_string(),
            source,
        })
    }
}

/// `[key]` table for the background subtractor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackgroundSubtractorConfig {
    pub background: Option<PathBuf>,
}

/// `[key]` table for the difference detector, as written in the file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DifferenceDetectorConfig {
    pub blur: Option<i64>,
    pub diff_threshold: Option<i64>,
    pub tune: Option<bool>,
}

/// Validated difference detector settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferenceSettings {
    /// Box blur half-size; 0 disables blurring
    pub blur: u32,
    /// Pixels whose difference exceeds this become foreground
    pub diff_threshold: u16,
    pub tune: bool,
}

impl Default for DifferenceSettings {
    fn default() -> Self {
        Self {
            blur: DEFAULT_BLUR,
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            tune: false,
        }
    }
}

impl DifferenceDetectorConfig {
    /// Apply the file values on top of `base`, rejecting out-of-range numbers
    pub fn resolve(&self, key: &str, base: DifferenceSettings) -> Result<DifferenceSettings, ConfigError> {
        let mut settings = base;

        if let Some(blur) = self.blur {
            settings.blur = checked_range(key, "blur", blur, MAX_BLUR, "0..=50")? as u32;
        }
        if let Some(threshold) = self.diff_threshold {
            settings.diff_threshold =
                checked_range(key, "diff_threshold", threshold, MAX_DIFF_THRESHOLD, "0..=256")? as u16;
        }
        if let Some(tune) = self.tune {
            settings.tune = tune;
        }

        Ok(settings)
    }
}

fn checked_range(
    key: &str,
    field: &'static str,
    value: i64,
    max: i64,
    expected: &'static str,
) -> Result<i64, ConfigError> {
    if (0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            field,
            expected,
            value,
        })
    }
}
