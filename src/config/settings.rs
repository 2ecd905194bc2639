use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::geo::{Coordinate, MIN_RADIUS_METERS};
use crate::domain::viewport::{MAX_ZOOM, MIN_ZOOM};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "MAP_PROMPT_";

/// Runtime settings for the map widget
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Center used until the device position is known
    pub default_center: Coordinate,
    pub initial_zoom: f64,
    /// Zoom the view flies to when the committed center changes
    pub focus_zoom: f64,
    pub initial_radius: f64,
    pub radius_step: f64,
    pub geocoder_url: String,
    pub submit_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub workers: usize,
    pub window_width: u32,
    pub window_height: u32,
    /// TrueType font for labels; labels are skipped when unset or unreadable
    pub font_path: Option<PathBuf>,
    /// Skip the platform location service and use this position instead
    pub device_position: Option<Coordinate>,
}

impl MapConfig {
    pub const MIN_WINDOW_WIDTH: u32 = 480;
    pub const MIN_WINDOW_HEIGHT: u32 = 360;
    pub const MAX_WORKERS: usize = 16;

    /// Defaults, then the optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `MAP_PROMPT_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, value)) = var("SUBMIT_URL") {
            self.submit_url = value;
        }
        if let Some((_, value)) = var("GEOCODER_URL") {
            self.geocoder_url = value;
        }
        if let Some((_, value)) = var("USER_AGENT") {
            self.user_agent = value;
        }
        if let Some((_, value)) = var("FONT") {
            self.font_path = Some(PathBuf::from(value));
        }
        if let Some((key, value)) = var("RADIUS_STEP") {
            self.radius_step = parse_env(&key, &value)?;
        }
        if let Some((key, value)) = var("INITIAL_RADIUS") {
            self.initial_radius = parse_env(&key, &value)?;
        }
        if let Some((key, value)) = var("WORKERS") {
            self.workers = parse_env(&key, &value)?;
        }
        if let Some((key, value)) = var("DEVICE_POSITION") {
            self.device_position = Some(
                parse_coordinate(&value).ok_or(ConfigError::InvalidEnv { key, value })?,
            );
        }
        Ok(())
    }

    /// Rejects values the rest of the program cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_coordinate("default_center", self.default_center)?;
        if let Some(position) = self.device_position {
            check_coordinate("device_position", position)?;
        }
        for (field, zoom) in [("initial_zoom", self.initial_zoom), ("focus_zoom", self.focus_zoom)] {
            if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
                return Err(invalid(field, format!("must be within {MIN_ZOOM}..={MAX_ZOOM}")));
            }
        }
        if !self.initial_radius.is_finite() || self.initial_radius < MIN_RADIUS_METERS {
            return Err(invalid(
                "initial_radius",
                format!("must be at least {MIN_RADIUS_METERS} meters"),
            ));
        }
        if !self.radius_step.is_finite() || self.radius_step <= 0.0 {
            return Err(invalid("radius_step", "must be a positive number of meters"));
        }
        for (field, url) in [("geocoder_url", &self.geocoder_url), ("submit_url", &self.submit_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(field, "must be an http(s) URL"));
            }
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be positive"));
        }
        if self.workers == 0 || self.workers > Self::MAX_WORKERS {
            return Err(invalid(
                "workers",
                format!("must be within 1..={}", Self::MAX_WORKERS),
            ));
        }
        if self.window_width < Self::MIN_WINDOW_WIDTH || self.window_height < Self::MIN_WINDOW_HEIGHT {
            return Err(invalid(
                "window_width/window_height",
                format!(
                    "window must be at least {}x{}",
                    Self::MIN_WINDOW_WIDTH,
                    Self::MIN_WINDOW_HEIGHT
                ),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: Coordinate::default(),
            initial_zoom: 10.0,
            focus_zoom: 12.0,
            initial_radius: 5000.0,
            radius_step: 1000.0,
            geocoder_url: "https://nominatim.openstreetmap.org/search".to_string(),
            submit_url: "http://localhost:8080/api/gemini/generate".to_string(),
            user_agent: concat!("map-prompt/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 15,
            workers: 2,
            window_width: 1280,
            window_height: 800,
            font_path: None,
            device_position: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Environment variable {key} has an invalid value: {value:?}")]
    InvalidEnv { key: String, value: String },
    #[error("Invalid setting {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn check_coordinate(field: &'static str, coord: Coordinate) -> Result<(), ConfigError> {
    Coordinate::new(coord.latitude, coord.longitude)
        .map(|_| ())
        .map_err(|err| invalid(field, err.to_string()))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parses "lat,lon"
pub fn parse_coordinate(text: &str) -> Option<Coordinate> {
    let (lat, lon) = text.split_once(',')?;
    let lat = lat.trim().parse().ok()?;
    let lon = lon.trim().parse().ok()?;
    Coordinate::new(lat, lon).ok()
}
