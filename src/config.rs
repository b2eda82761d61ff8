use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "GLOBE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// A preset city listed in the config file
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CityEntry {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

/// Tunables for the globe. Every field is optional in the file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobeConfig {
    /// Degrees of eastward spin per frame
    pub rotation_speed: f64,
    /// Each ease step closes 1/ease_divisor of the remaining gap
    pub ease_divisor: f64,
    /// Target frame period
    pub frame_millis: u64,
    /// Degrees of spin per Braille pixel of globe drag
    pub spin_drag_sensitivity: f64,
    /// Longitude spacing of latitude-line samples
    pub parallel_step_degrees: f64,
    /// Directory holding land.json and cities.json
    pub data_dir: PathBuf,
    /// Preset cities; when empty, cities.json or the built-in list is used
    pub cities: Vec<CityEntry>,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.2,
            ease_divisor: 20.0,
            frame_millis: 16,
            spin_drag_sensitivity: 0.2,
            parallel_step_degrees: 5.0,
            data_dir: PathBuf::from("data"),
            cities: Vec::new(),
        }
    }
}

impl GlobeConfig {
    /// Load from `GLOBE_CONFIG`, or `data/globe.json`, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new("data").join("globe.json"));

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut bytes = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = simd_json::serde::from_slice(&mut bytes).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or blow up the animation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rotation_speed.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "rotation_speed",
                message: format!("{} is not finite", self.rotation_speed),
            });
        }
        if !(self.ease_divisor >= 1.0 && self.ease_divisor.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "ease_divisor",
                message: format!("{} must be a finite number >= 1", self.ease_divisor),
            });
        }
        if self.frame_millis == 0 {
            return Err(ConfigError::InvalidValue {
                field: "frame_millis",
                message: "must be at least 1".to_string(),
            });
        }
        if !self.spin_drag_sensitivity.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "spin_drag_sensitivity",
                message: format!("{} is not finite", self.spin_drag_sensitivity),
            });
        }
        if !(self.parallel_step_degrees > 0.0 && self.parallel_step_degrees <= 90.0) {
            return Err(ConfigError::InvalidValue {
                field: "parallel_step_degrees",
                message: format!("{} must be in (0, 90]", self.parallel_step_degrees),
            });
        }
        for city in &self.cities {
            if !(-180.0..=180.0).contains(&city.lon) || !(-90.0..=90.0).contains(&city.lat) {
                return Err(ConfigError::InvalidValue {
                    field: "cities",
                    message: format!("{} has out-of-range coordinates", city.name),
                });
            }
        }
        Ok(())
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_millis)
    }
}
