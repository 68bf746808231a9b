//! Search box backends
//!
//! The layer index searches the names of the markers on the map and keeps
//! the region gate on selection. The geocoder asks Nominatim and returns
//! results anywhere; a forecast for one of them still has to pass the gate.

use anyhow::Context;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::MapError;
use crate::config::{AppConfig, SearchProvider};
use crate::models::{LatLng, PointOfInterest};
use crate::region::Region;
use crate::weather::{build_client, get_text};

const GEOCODER_TIMEOUT_SECONDS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub label: String,
    pub position: LatLng,
    /// Zoom the map moves to when the result is selected
    pub zoom: u8,
    /// Whether selecting the result is subject to the region gate
    pub gated: bool,
    /// Whether the result lies inside the region
    pub in_region: bool,
}

pub enum SearchBackend {
    Layer(LayerIndex),
    Geocoder(Geocoder),
}

impl SearchBackend {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(match config.search.provider {
            SearchProvider::Layer => SearchBackend::Layer(LayerIndex::new(
                config.parks.clone(),
                config.map.region,
                config.map.zoom,
            )),
            SearchProvider::Geocoder => SearchBackend::Geocoder(Geocoder::new(config)?),
        })
    }

    pub async fn search(&self, query: &str) -> crate::Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            SearchBackend::Layer(index) => Ok(index.search(query)),
            SearchBackend::Geocoder(geocoder) => geocoder.search(query).await,
        }
    }
}

/// Case-insensitive substring search over marker names
pub struct LayerIndex {
    entries: Vec<PointOfInterest>,
    region: Region,
    zoom: u8,
}

impl LayerIndex {
    #[must_use]
    pub fn new(entries: Vec<PointOfInterest>, region: Region, zoom: u8) -> Self {
        Self {
            entries,
            region,
            zoom,
        }
    }

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .map(|entry| SearchResult {
                label: entry.name.clone(),
                position: entry.position(),
                zoom: self.zoom,
                gated: true,
                in_region: self.region.contains(&entry.position()),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

/// Nominatim free-text search
pub struct Geocoder {
    client: ClientWithMiddleware,
    url: String,
    limit: usize,
    zoom: u8,
    region: Region,
}

impl Geocoder {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = build_client(&config.forecast.user_agent, GEOCODER_TIMEOUT_SECONDS, 0)
            .with_context(|| "Failed to create geocoding client")?;

        Ok(Self {
            client,
            url: config.search.geocoder_url.clone(),
            limit: config.search.limit,
            zoom: config.search.zoom,
            region: config.map.region,
        })
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> crate::Result<Vec<SearchResult>> {
        let url = format!(
            "{}?q={}&format=json&limit={}",
            self.url,
            urlencoding::encode(query),
            self.limit
        );
        let body = get_text(&self.client, &url).await?;
        let places: Vec<NominatimPlace> = serde_json::from_str(&body)?;
        debug!("Geocoder returned {} places", places.len());

        places
            .into_iter()
            .map(|place| {
                let lat = place.lat.parse::<f64>().map_err(|_| {
                    MapError::parse(format!("invalid latitude '{}' from geocoder", place.lat))
                })?;
                let lon = place.lon.parse::<f64>().map_err(|_| {
                    MapError::parse(format!("invalid longitude '{}' from geocoder", place.lon))
                })?;
                let position = LatLng::new(lat, lon);
                Ok(SearchResult {
                    label: place.display_name,
                    position,
                    zoom: self.zoom,
                    gated: false,
                    in_region: self.region.contains(&position),
                })
            })
            .collect()
    }
}
