//! MET Norway `locationforecast` client

use std::time::Instant;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info, instrument, warn};

use super::{ForecastSource, get_text};
use crate::config::ForecastConfig;
use crate::models::{ForecastResponse, LatLng};

/// MET Norway serves coordinates with at most four decimals
const COORDINATE_DECIMALS: u32 = 4;

pub struct MetNoClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl MetNoClient {
    pub fn new(config: &ForecastConfig) -> anyhow::Result<Self> {
        let client = super::build_client(
            &config.user_agent,
            config.timeout_seconds,
            config.max_retries,
        )?;
        Ok(Self::with_client(client, &config.base_url))
    }

    #[must_use]
    pub fn with_client(client: ClientWithMiddleware, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ForecastSource for MetNoClient {
    fn request_url(&self, point: LatLng) -> String {
        let point = point.rounded(COORDINATE_DECIMALS);
        format!(
            "{}/locationforecast/2.0/compact?lat={}&lon={}",
            self.base_url, point.lat, point.lon
        )
    }

    #[instrument(skip(self), fields(lat = point.lat, lon = point.lon))]
    async fn fetch(&self, point: LatLng) -> crate::Result<ForecastResponse> {
        let url = self.request_url(point);
        debug!("MET Norway request URL: {}", url);
        let start_time = Instant::now();

        let body = get_text(&self.client, &url).await?;
        let response: ForecastResponse = serde_json::from_str(&body)?;

        let elapsed = start_time.elapsed();
        info!(
            "Retrieved {} forecast steps in {:.3}s",
            response.timeseries().len(),
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow forecast response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(response)
    }
}
