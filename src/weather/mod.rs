//! Remote weather data sources
//!
//! Each source is a trait so the map workflows can be driven by a fake in
//! tests; the real implementations share one HTTP client setup.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::models::{ForecastResponse, LatLng, WindField};

pub mod met_no;
pub mod wind_field;

pub use met_no::MetNoClient;
pub use wind_field::WindFieldClient;

/// Point forecast provider
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// URL that `fetch` requests for `point`, shown as download link
    fn request_url(&self, point: LatLng) -> String;

    async fn fetch(&self, point: LatLng) -> crate::Result<ForecastResponse>;
}

/// Gridded wind field provider
#[async_trait]
pub trait WindSource: Send + Sync {
    fn url(&self) -> &str;

    async fn fetch(&self) -> crate::Result<WindField>;
}

/// HTTP client with timeout, user agent and optional retries of transient
/// failures.
pub fn build_client(
    user_agent: &str,
    timeout_seconds: u32,
    max_retries: u32,
) -> anyhow::Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(user_agent)
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    let mut builder = ClientBuilder::new(client);
    if max_retries > 0 {
        let policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
    }
    Ok(builder.build())
}

/// Send a GET request and return the body of a successful response.
pub(crate) async fn get_text(client: &ClientWithMiddleware, url: &str) -> crate::Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(crate::MapError::api(format!("{url} answered with {status}")));
    }
    Ok(response.text().await?)
}
