//! Data models for the weather map
//!
//! - Location: map coordinates
//! - Forecast: MET Norway point forecast response
//! - Wind: gridded wind field snapshot
//! - Poi: static markers

pub mod forecast;
pub mod location;
pub mod poi;
pub mod wind;

pub use forecast::{ForecastResponse, TimeStep};
pub use location::LatLng;
pub use poi::{PoiAttribution, PointOfInterest};
pub use wind::WindField;
