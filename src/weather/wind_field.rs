//! Client for the ECMWF 10 m wind field published as grib2json

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{info, instrument};

use super::{WindSource, get_text};
use crate::config::WindConfig;
use crate::models::WindField;

pub struct WindFieldClient {
    client: ClientWithMiddleware,
    url: String,
}

impl WindFieldClient {
    pub fn new(config: &WindConfig, user_agent: &str) -> anyhow::Result<Self> {
        let client = super::build_client(user_agent, config.timeout_seconds, 0)?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl WindSource for WindFieldClient {
    fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> crate::Result<WindField> {
        let body = get_text(&self.client, &self.url).await?;
        let field: WindField = serde_json::from_str(&body)?;
        field.validate()?;

        info!(
            "Loaded wind field with {} records, valid {:?}",
            field.records.len(),
            field.valid_time()
        );
        Ok(field)
    }
}
