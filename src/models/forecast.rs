//! MET Norway `locationforecast/2.0/compact` response model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level GeoJSON document returned by the forecast endpoint.
///
/// The compact product is a single point `Feature`; a `FeatureCollection` of
/// point features is accepted as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ForecastResponse {
    Feature(ForecastFeature),
    FeatureCollection { features: Vec<ForecastFeature> },
}

impl ForecastResponse {
    /// The first point feature carrying a forecast, if any
    #[must_use]
    pub fn feature(&self) -> Option<&ForecastFeature> {
        match self {
            ForecastResponse::Feature(feature) => Some(feature),
            ForecastResponse::FeatureCollection { features } => features.first(),
        }
    }

    #[must_use]
    pub fn timeseries(&self) -> &[TimeStep] {
        self.feature()
            .map_or(&[], |feature| feature.properties.timeseries.as_slice())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastFeature {
    #[serde(default)]
    pub geometry: Option<PointGeometry>,
    pub properties: ForecastProperties,
}

/// GeoJSON point, `[lon, lat, altitude]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointGeometry {
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub meta: Option<ForecastMeta>,
    pub timeseries: Vec<TimeStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastMeta {
    pub updated_at: Option<DateTime<Utc>>,
}

/// One sample of the forecast time series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeStep {
    pub time: DateTime<Utc>,
    pub data: StepData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepData {
    pub instant: Instant,
    #[serde(default)]
    pub next_1_hours: Option<Period>,
    #[serde(default)]
    pub next_6_hours: Option<Period>,
    #[serde(default)]
    pub next_12_hours: Option<Period>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instant {
    pub details: InstantDetails,
}

/// Instantaneous measurements. Every field is optional in the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstantDetails {
    /// hPa
    pub air_pressure_at_sea_level: Option<f64>,
    /// °C
    pub air_temperature: Option<f64>,
    /// %
    pub cloud_area_fraction: Option<f64>,
    /// mm
    pub precipitation_amount: Option<f64>,
    /// %
    pub relative_humidity: Option<f64>,
    /// degrees, direction the wind blows from
    pub wind_from_direction: Option<f64>,
    /// m/s
    pub wind_speed: Option<f64>,
}

/// Aggregate over the period following a time step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    #[serde(default)]
    pub summary: Option<PeriodSummary>,
    #[serde(default)]
    pub details: Option<PeriodDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub symbol_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodDetails {
    pub precipitation_amount: Option<f64>,
}

impl Period {
    fn symbol_code(&self) -> Option<&str> {
        self.summary.as_ref().map(|s| s.symbol_code.as_str())
    }
}

impl TimeStep {
    /// Symbol code for the upcoming hour, falling back to the 6 and 12 hour
    /// summaries that replace it further out in the series.
    #[must_use]
    pub fn symbol_code(&self) -> Option<&str> {
        [
            &self.data.next_1_hours,
            &self.data.next_6_hours,
            &self.data.next_12_hours,
        ]
        .into_iter()
        .flatten()
        .find_map(Period::symbol_code)
    }

    /// Instant precipitation if published, otherwise the next-hour sum
    #[must_use]
    pub fn precipitation_amount(&self) -> Option<f64> {
        self.data.instant.details.precipitation_amount.or_else(|| {
            self.data
                .next_1_hours
                .as_ref()
                .and_then(|p| p.details.as_ref())
                .and_then(|d| d.precipitation_amount)
        })
    }
}

/// Convert m/s to km/h, rounded to the nearest integer
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn ms_to_kmh(speed_ms: f64) -> i64 {
    (speed_ms * 3.6).round() as i64
}
