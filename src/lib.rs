//! `wetterkarte` - interactive weather map for Austria
//!
//! Point forecasts from MET Norway, the ECMWF 10 m wind field and the
//! Austrian national parks, served to a Leaflet page. The library holds the
//! region gate, the forecast and wind workflows and the popup rendering;
//! the binary wires them into an axum server.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod notify;
pub mod parks;
pub mod region;
pub mod render;
pub mod search;
pub mod weather;
pub mod web;
pub mod wind;

// Re-export core types for public API
pub use app::MapApp;
pub use config::AppConfig;
pub use error::MapError;
pub use forecast::{ForecastOutcome, Interaction};
pub use models::{LatLng, PointOfInterest};
pub use region::{Region, is_in_region};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;
