use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filtering::filter_operation::FilterOperation;
use crate::filtering::filter_settings::FilterSettings;
use crate::pipeline::pipeline_driver::PipelineDriver;
use crate::shared::constants::TICK_INTERVAL_MS;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no configuration directory on this platform")]
    NoConfigDir,
    #[error("tick interval must be at least 1 ms")]
    ZeroTickInterval,
}

/// Persisted host configuration: which filters are on, their parameters,
/// the camera toggle and the tick cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub camera_enabled: bool,
    /// Capture device passed to the camera source. `None` picks the
    /// platform default.
    pub device: Option<String>,
    pub tick_interval_ms: u64,
    /// Enabled filters. Order within a stage is the order they run in.
    pub filters: Vec<FilterOperation>,
    pub parameters: FilterSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            camera_enabled: true,
            device: None,
            tick_interval_ms: TICK_INTERVAL_MS,
            filters: Vec::new(),
            parameters: FilterSettings::default(),
        }
    }
}

impl PipelineSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("framelab").join("settings.json"))
    }

    /// Loads the user's settings, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|err| {
            log::warn!("Ignoring settings: {err}");
            Self::default()
        })
    }

    /// Writes the settings to the user's config directory and returns the
    /// path written.
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_error = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_error)
    }

    /// Pushes these settings into a driver: camera toggle, parameters and
    /// the exact set of enabled filters.
    pub fn apply(&self, driver: &mut PipelineDriver) {
        driver.set_camera_enabled(self.camera_enabled);
        driver.filter_settings().update(|s| *s = self.parameters);
        for &op in FilterOperation::ALL {
            if !self.filters.contains(&op) {
                driver.set_filter_enabled(op, false);
            }
        }
        for &op in &self.filters {
            driver.set_filter_enabled(op, true);
        }
    }

    /// Captures the driver's current configuration.
    pub fn capture(driver: &PipelineDriver, device: Option<String>, tick_interval_ms: u64) -> Self {
        let chain = driver.filter_chain();
        Self {
            camera_enabled: driver.camera_enabled(),
            device,
            tick_interval_ms,
            filters: chain
                .pre_filters()
                .iter()
                .chain(chain.post_filters())
                .copied()
                .collect(),
            parameters: driver.filter_settings().snapshot(),
        }
    }
}
