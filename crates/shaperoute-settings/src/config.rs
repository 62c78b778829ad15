//! Configuration for the shape route client
//!
//! Configuration is organized into sections:
//! - Backend API location
//! - Map defaults (start view, zoom levels, fit margin, surface size)
//! - Route form bounds (distance range and step)
//! - Track download destination
//!
//! Values come from the built-in defaults, optionally replaced by a JSON or
//! TOML file named in `SHAPEROUTE_CONFIG`, and finally by environment
//! overrides such as `SHAPEROUTE_API_BASE_URL`.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use shaperoute_core::Position;
use std::path::{Path, PathBuf};

/// Environment variable holding the backend base URL.
pub const API_BASE_URL_ENV: &str = "SHAPEROUTE_API_BASE_URL";

/// Environment variable naming an optional config file.
pub const CONFIG_PATH_ENV: &str = "SHAPEROUTE_CONFIG";

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the route generation service
    pub base_url: String,
    /// Connect timeout in milliseconds. Requests themselves have no timeout;
    /// route generation can legitimately take tens of seconds.
    pub connect_timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

/// Map defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Initial zoom level
    pub default_zoom: f64,
    /// Zoom applied after a successful location search
    pub search_zoom: f64,
    /// Margin in pixels kept around a route when fitting the view to it
    pub fit_padding_px: f64,
    /// Width of the rendered map surface in pixels
    pub surface_width_px: f64,
    /// Height of the rendered map surface in pixels
    pub surface_height_px: f64,
    /// Lowest zoom level the surface allows
    pub min_zoom: f64,
    /// Highest zoom level the surface allows
    pub max_zoom: f64,
    /// Initial map center
    pub default_center: Position,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            default_zoom: 13.0,
            search_zoom: 14.0,
            fit_padding_px: 50.0,
            surface_width_px: 1024.0,
            surface_height_px: 768.0,
            min_zoom: 0.0,
            max_zoom: 18.0,
            default_center: Position::new(48.8566, 2.3522),
        }
    }
}

/// Route form settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// Distance preselected at startup, in km
    pub default_distance_km: f64,
    /// Smallest selectable distance, in km
    pub min_distance_km: f64,
    /// Largest selectable distance, in km
    pub max_distance_km: f64,
    /// Selector step, in km
    pub step_km: f64,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            default_distance_km: 5.0,
            min_distance_km: 1.0,
            max_distance_km: 20.0,
            step_km: 0.5,
        }
    }
}

/// Track download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Ask for the destination with a native save dialog
    pub use_dialog: bool,
    /// Directory used when the dialog is disabled
    pub directory: PathBuf,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            use_dialog: true,
            directory: dirs::download_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub map: MapSettings,
    pub route: RouteSettings,
    pub download: DownloadSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the effective configuration from the process environment
    pub fn load() -> SettingsResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Build the effective configuration using `lookup` for environment values
    pub fn load_with<F>(lookup: F) -> SettingsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => {
                tracing::info!("Loading configuration from {}", path);
                Self::load_from_file(Path::new(&path))?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the current values
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Backend base URL overridden by {}", API_BASE_URL_ENV);
            self.api.base_url = url.trim().to_string();
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Empty("api.base_url".to_string()));
        }

        let route = &self.route;
        let map = &self.map;
        let numbers = [
            ("route.step_km", route.step_km),
            ("route.min_distance_km", route.min_distance_km),
            ("route.max_distance_km", route.max_distance_km),
            ("route.default_distance_km", route.default_distance_km),
            ("map.default_zoom", map.default_zoom),
            ("map.search_zoom", map.search_zoom),
            ("map.fit_padding_px", map.fit_padding_px),
            ("map.surface_width_px", map.surface_width_px),
            ("map.surface_height_px", map.surface_height_px),
            ("map.min_zoom", map.min_zoom),
            ("map.max_zoom", map.max_zoom),
            ("map.default_center.lat", map.default_center.lat),
            ("map.default_center.lon", map.default_center.lon),
        ];
        // NaN slips through every ordered comparison below.
        if let Some((key, value)) = numbers.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(out_of_range(key, value));
        }

        if route.step_km <= 0.0 {
            return Err(out_of_range("route.step_km", route.step_km));
        }
        if route.min_distance_km <= 0.0 || route.min_distance_km >= route.max_distance_km {
            return Err(out_of_range("route.min_distance_km", route.min_distance_km));
        }
        if !(route.min_distance_km..=route.max_distance_km).contains(&route.default_distance_km) {
            return Err(out_of_range(
                "route.default_distance_km",
                route.default_distance_km,
            ));
        }

        if map.surface_width_px <= 0.0 || map.surface_height_px <= 0.0 {
            return Err(out_of_range("map.surface_width_px", map.surface_width_px));
        }
        if map.fit_padding_px < 0.0
            || map.fit_padding_px * 2.0 >= map.surface_width_px.min(map.surface_height_px)
        {
            return Err(out_of_range("map.fit_padding_px", map.fit_padding_px));
        }
        if map.min_zoom < 0.0 || map.min_zoom > map.max_zoom {
            return Err(out_of_range("map.min_zoom", map.min_zoom));
        }

        Ok(())
    }
}

fn out_of_range(key: &str, value: f64) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}
