//! Shape Route Settings Crate
//!
//! Handles application configuration: defaults, optional config file, and
//! environment overrides.

pub mod config;
pub mod error;

pub use config::{
    ApiSettings, Config, DownloadSettings, MapSettings, RouteSettings, API_BASE_URL_ENV,
    CONFIG_PATH_ENV,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
