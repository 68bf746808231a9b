use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wetterkarte::config::LoggingConfig;
use wetterkarte::{AppConfig, MapApp, web};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wetterkarte={0},tower_http={0}", logging.level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    info!("Starting wetterkarte {}", wetterkarte::VERSION);

    let app = Arc::new(MapApp::new(config)?);

    // Loaded once; the server starts accepting requests right away.
    let _wind_load = app.spawn_wind_load();

    web::run(app).await
}
