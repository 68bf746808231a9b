//! Configuration management for the weather map
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates everything once at startup. The defaults reproduce the
//! original page: Austria bounds, Innsbruck as center, MET Norway forecasts
//! and the Innsbruck ECMWF wind field.

use crate::MapError;
use crate::models::{LatLng, PoiAttribution, PointOfInterest};
use crate::region::Region;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub wind: WindConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Markers of the parks layer
    #[serde(default = "default_parks")]
    pub parks: Vec<PointOfInterest>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the page and the `icons/` folder
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Map view and region settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial center `[lat, lon]`, also the point of the startup forecast
    #[serde(default = "default_center")]
    pub center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    /// Forecasts are only shown inside this box
    #[serde(default)]
    pub region: Region,
    /// IANA time zone used for every displayed timestamp
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

/// MET Norway forecast API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_base_url")]
    pub base_url: String,
    /// MET Norway rejects requests without an identifying user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures, 0 sends every request exactly once
    #[serde(default)]
    pub max_retries: u32,
}

/// Wind field source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindConfig {
    #[serde(default = "default_wind_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Which backend answers the search box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    /// Names of the markers on the map layers
    #[default]
    Layer,
    /// Public free-text geocoder (Nominatim)
    Geocoder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub provider: SearchProvider,
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,
    /// Zoom applied when the map jumps to a geocoder result
    #[serde(default = "default_search_zoom")]
    pub zoom: u8,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "frontend".to_string()
}

fn default_center() -> [f64; 2] {
    [47.267_222, 11.392_778]
}

fn default_zoom() -> u8 {
    7
}

fn default_time_zone() -> String {
    "Europe/Vienna".to_string()
}

fn default_forecast_base_url() -> String {
    "https://api.met.no/weatherapi".to_string()
}

fn default_user_agent() -> String {
    concat!("wetterkarte/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_wind_url() -> String {
    "https://geographie.uibk.ac.at/data/ecmwf/data/wind-10u-10v-europe.json".to_string()
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_search_zoom() -> u8 {
    10
}

fn default_search_limit() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn park(name: &str, lat: f64, lon: f64, website: &str) -> PointOfInterest {
    PointOfInterest {
        name: name.to_string(),
        lat,
        lon,
        image: None,
        attribution: Some(PoiAttribution {
            text: format!("Infos: {}", website.trim_start_matches("https://")),
            url: Some(website.to_string()),
        }),
    }
}

/// The six Austrian national parks, each linking its park administration.
/// Photos are left to the configuration.
#[must_use]
pub fn default_parks() -> Vec<PointOfInterest> {
    vec![
        park("Nationalpark Hohe Tauern", 47.1208, 12.6967, "https://hohetauern.at"),
        park("Nationalpark Kalkalpen", 47.7667, 14.3667, "https://www.kalkalpen.at"),
        park("Nationalpark Gesäuse", 47.5667, 14.6167, "https://nationalpark-gesaeuse.at"),
        park("Nationalpark Donau-Auen", 48.1417, 16.7333, "https://www.donauauen.at"),
        park("Nationalpark Thayatal", 48.8500, 15.8833, "https://www.np-thayatal.at"),
        park(
            "Nationalpark Neusiedler See - Seewinkel",
            47.7700,
            16.7700,
            "https://www.nationalparkneusiedlersee.at",
        ),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            map: MapConfig::default(),
            forecast: ForecastConfig::default(),
            wind: WindConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
            parks: default_parks(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: default_center(),
            zoom: default_zoom(),
            region: Region::default(),
            time_zone: default_time_zone(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_forecast_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            url: default_wind_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProvider::default(),
            geocoder_url: default_geocoder_url(),
            zoom: default_search_zoom(),
            limit: default_search_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl MapConfig {
    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng::from(self.center)
    }

    /// Parsed display time zone; `validate` guarantees the name is known
    #[must_use]
    pub fn tz(&self) -> Tz {
        self.time_zone.parse().unwrap_or(chrono_tz::Europe::Vienna)
    }
}

impl AppConfig {
    /// Load configuration from the default location and environment variables
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("WETTERKARTE_CONFIG").map(PathBuf::from);
        Self::load_from_path(path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|p| p.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WETTERKARTE_FORECAST__BASE_URL overrides forecast.base_url
        builder = builder.add_source(
            Environment::with_prefix("WETTERKARTE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wetterkarte").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.forecast.base_url.is_empty() {
            self.forecast.base_url = default_forecast_base_url();
        }
        if self.forecast.user_agent.is_empty() {
            self.forecast.user_agent = default_user_agent();
        }
        if self.forecast.timeout_seconds == 0 {
            self.forecast.timeout_seconds = default_timeout();
        }
        if self.wind.url.is_empty() {
            self.wind.url = default_wind_url();
        }
        if self.wind.timeout_seconds == 0 {
            self.wind.timeout_seconds = default_timeout();
        }
        if self.search.geocoder_url.is_empty() {
            self.search.geocoder_url = default_geocoder_url();
        }
        if self.search.limit == 0 {
            self.search.limit = default_search_limit();
        }
        if self.map.time_zone.is_empty() {
            self.map.time_zone = default_time_zone();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_region()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_parks()?;
        Ok(())
    }

    fn validate_region(&self) -> Result<()> {
        let region = &self.map.region;
        if !region.is_finite() {
            return Err(MapError::config("Map region corners must be finite numbers").into());
        }

        if region.min_lat() == region.max_lat() || region.min_lon() == region.max_lon() {
            return Err(MapError::config("Map region must not be empty").into());
        }

        if region.min_lat() < -90.0 || region.max_lat() > 90.0 {
            return Err(MapError::config("Map region latitude must be within -90..90").into());
        }

        if region.min_lon() < -180.0 || region.max_lon() > 180.0 {
            return Err(MapError::config("Map region longitude must be within -180..180").into());
        }

        if !region.contains(&self.map.center()) {
            return Err(MapError::config(format!(
                "Map center {} lies outside the map region",
                self.map.center().format_coordinates()
            ))
            .into());
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.map.zoom > 19 || self.search.zoom > 19 {
            return Err(MapError::config("Zoom levels cannot exceed 19").into());
        }

        if self.forecast.timeout_seconds > 300 || self.wind.timeout_seconds > 300 {
            return Err(MapError::config("Request timeout cannot exceed 300 seconds").into());
        }

        if self.forecast.max_retries > 10 {
            return Err(MapError::config("Forecast max retries cannot exceed 10").into());
        }

        if self.search.limit > 50 {
            return Err(MapError::config("Search limit cannot exceed 50").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Forecast base URL", &self.forecast.base_url),
            ("Wind URL", &self.wind.url),
            ("Geocoder URL", &self.search.geocoder_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    MapError::config(format!("{name} must be a valid HTTP or HTTPS URL")).into(),
                );
            }
        }

        if self.map.time_zone.parse::<Tz>().is_err() {
            return Err(
                MapError::config(format!("Unknown time zone '{}'", self.map.time_zone)).into(),
            );
        }

        Ok(())
    }

    fn validate_parks(&self) -> Result<()> {
        for park in &self.parks {
            if park.name.trim().is_empty() {
                return Err(MapError::config("Park names cannot be empty").into());
            }
            if !park.lat.is_finite() || !park.lon.is_finite() {
                return Err(MapError::config(format!(
                    "Park '{}' has invalid coordinates",
                    park.name
                ))
                .into());
            }
        }
        Ok(())
    }
}
