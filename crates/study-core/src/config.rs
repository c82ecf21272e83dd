//! Study configuration
//!
//! Loaded from a TOML file; every field has a default so a partial (or
//! absent) file is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Study configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    /// Root under which all image folders live
    pub image_root: String,
    /// File names present in both pretest folders
    pub pretest_files: Vec<String>,
    /// Pause before an image rating is committed, in milliseconds
    pub advance_delay_ms: u64,
    /// Youngest accepted participant
    pub min_age: u32,
    /// Oldest accepted participant
    pub max_age: u32,
    /// Question catalog file, built-in catalog when unset
    pub catalog_path: Option<PathBuf>,
    /// Where session snapshots are written, no persistence when unset
    pub store_dir: Option<PathBuf>,
    /// Where CSV exports are written
    pub export_dir: PathBuf,
}

impl StudyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            Some(path) => {
                tracing::debug!(
                    "Configuration file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_age == 0 || self.min_age > self.max_age {
            return Err(ConfigError::Invalid(format!(
                "age range {}..={} is empty or includes 0",
                self.min_age, self.max_age
            )));
        }
        if self.pretest_files.is_empty() {
            return Err(ConfigError::Invalid("no pretest files".to_string()));
        }
        Ok(())
    }

    /// With image root
    #[inline]
    #[must_use]
    pub fn with_image_root(mut self, root: impl Into<String>) -> Self {
        self.image_root = root.into();
        self
    }

    /// With advance delay
    #[inline]
    #[must_use]
    pub fn with_advance_delay_ms(mut self, delay_ms: u64) -> Self {
        self.advance_delay_ms = delay_ms;
        self
    }

    /// With store directory
    #[inline]
    #[must_use]
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }

    /// With export directory
    #[inline]
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Advance delay as a duration
    #[inline]
    #[must_use]
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            image_root: "/images".to_string(),
            pretest_files: vec!["1.png".into(), "2.png".into(), "3.png".into()],
            advance_delay_ms: 300,
            min_age: 18,
            max_age: 100,
            catalog_path: None,
            store_dir: None,
            export_dir: PathBuf::from("."),
        }
    }
}
