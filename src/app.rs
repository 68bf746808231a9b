//! Application state shared by every map workflow
//!
//! Built once at startup and handed to the web layer as `Arc<MapApp>`.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::config::AppConfig;
use crate::forecast::{ForecastOutcome, ForecastOverlay, Interaction, Popup};
use crate::models::LatLng;
use crate::notify::{Notice, NotificationSink, RecentNotices};
use crate::parks::{Marker, render_parks};
use crate::render;
use crate::search::{SearchBackend, SearchResult};
use crate::weather::{ForecastSource, MetNoClient, WindFieldClient, WindSource};
use crate::wind::{LoadedWind, VelocityDisplayOptions, WindOverlay};
use crate::{MapError, Result};

pub struct MapApp {
    config: AppConfig,
    forecasts: Arc<dyn ForecastSource>,
    wind_source: Arc<dyn WindSource>,
    search: SearchBackend,
    forecast_layer: ForecastOverlay,
    wind_layer: WindOverlay,
    parks: Vec<Marker>,
    notices: RecentNotices,
}

impl MapApp {
    /// Wire the real MET Norway, wind field and search clients
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let forecasts = Arc::new(MetNoClient::new(&config.forecast)?);
        let wind = Arc::new(WindFieldClient::new(
            &config.wind,
            &config.forecast.user_agent,
        )?);
        Self::with_sources(config, forecasts, wind)
    }

    pub fn with_sources(
        config: AppConfig,
        forecasts: Arc<dyn ForecastSource>,
        wind_source: Arc<dyn WindSource>,
    ) -> anyhow::Result<Self> {
        let search = SearchBackend::from_config(&config)?;
        let parks = render_parks(&config.parks);
        Ok(Self {
            config,
            forecasts,
            wind_source,
            search,
            forecast_layer: ForecastOverlay::new(),
            wind_layer: WindOverlay::new(),
            parks,
            notices: RecentNotices::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn forecast_layer(&self) -> &ForecastOverlay {
        &self.forecast_layer
    }

    #[must_use]
    pub fn wind_layer(&self) -> &WindOverlay {
        &self.wind_layer
    }

    #[must_use]
    pub fn parks(&self) -> &[Marker] {
        &self.parks
    }

    #[must_use]
    pub fn notices(&self) -> &RecentNotices {
        &self.notices
    }

    /// Region gate in front of every forecast request. Rejections raise an
    /// alert and never reach the network.
    pub fn check_region(&self, point: LatLng, origin: Interaction) -> Result<()> {
        if self.config.map.region.contains(&point) {
            return Ok(());
        }
        debug!(lat = point.lat, lon = point.lon, ?origin, "rejected point outside region");
        self.notices
            .notify(Notice::alert(origin.out_of_region_message()));
        Err(MapError::out_of_region(point.lat, point.lon))
    }

    /// Gate, fetch, render and open the forecast popup for `point` on the
    /// page identified by `client`.
    ///
    /// Fetch and parse failures are reported as toasts and returned; a
    /// response that arrives after the same page issued a newer request is
    /// dropped.
    #[instrument(skip(self), fields(lat = point.lat, lon = point.lon))]
    pub async fn show_forecast(
        &self,
        client: &str,
        point: LatLng,
        origin: Interaction,
    ) -> Result<ForecastOutcome> {
        self.check_region(point, origin)?;

        let token = self.forecast_layer.issue(client);
        let request_url = self.forecasts.request_url(point);

        let popup = self
            .fetch_popup(point, token, request_url)
            .await
            .inspect_err(|err| self.notices.notify(Notice::from_error(err)))?;

        let outcome = self.forecast_layer.open(client, popup);
        if let ForecastOutcome::Shown(popup) = &outcome {
            info!(token = popup.token, "forecast popup opened");
        }
        Ok(outcome)
    }

    async fn fetch_popup(&self, point: LatLng, token: u64, request_url: String) -> Result<Popup> {
        let response = self.forecasts.fetch(point).await?;
        let html = render::forecast_popup(&response, &request_url, self.config.map.tz())?;
        Ok(Popup {
            token,
            position: point,
            html: html.into_string(),
            request_url,
        })
    }

    /// Mark the wind layer as loading, then load it in the background.
    /// Requests for the layer wait until the load has finished.
    pub fn spawn_wind_load(self: &Arc<Self>) -> JoinHandle<()> {
        self.wind_layer.begin_loading();
        let app = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = app.load_wind().await {
                error!("Wind field could not be loaded: {}", err);
            }
        })
    }

    /// Fetch the wind field, put it on the wind layer and render the caption.
    /// Runs once at startup; a failure leaves the layer empty.
    #[instrument(skip(self))]
    pub async fn load_wind(&self) -> Result<()> {
        self.wind_layer.begin_loading();
        match self.fetch_wind().await {
            Ok(wind) => {
                info!(valid_time = %wind.valid_time, "wind layer ready");
                self.wind_layer.set(wind);
                Ok(())
            }
            Err(err) => {
                let notice = Notice::from_error(&err);
                self.wind_layer.fail(notice.message.clone());
                self.notices.notify(notice);
                Err(err)
            }
        }
    }

    async fn fetch_wind(&self) -> Result<LoadedWind> {
        let data = self.wind_source.fetch().await?;
        let valid_time = data
            .valid_time()
            .ok_or_else(|| MapError::parse("wind field has no valid time"))?;
        let source_url = self.wind_source.url().to_string();
        let caption_html =
            render::wind_caption(&source_url, valid_time, self.config.map.tz()).into_string();

        Ok(LoadedWind {
            data,
            display_options: VelocityDisplayOptions::default(),
            source_url,
            valid_time,
            caption_html,
        })
    }

    /// Answer the search box with the configured provider
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search
            .search(query)
            .await
            .inspect_err(|err| self.notices.notify(Notice::from_error(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::DEFAULT_CLIENT;
    use crate::models::{ForecastResponse, WindField};
    use crate::models::wind::tests::sample_field;
    use crate::notify::NoticeLevel;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn forecast_body(temperature: f64) -> ForecastResponse {
        serde_json::from_value(serde_json::json!({
            "type": "Feature",
            "properties": { "timeseries": [{
                "time": "2024-05-01T11:00:00Z",
                "data": {
                    "instant": { "details": { "air_temperature": temperature, "wind_speed": 2.777 } },
                    "next_1_hours": { "summary": { "symbol_code": "clearsky_day" } }
                }
            }] }
        }))
        .unwrap()
    }

    /// Forecast source whose responses are released by the test
    #[derive(Default)]
    struct GatedForecasts {
        calls: AtomicUsize,
        gates: Mutex<HashMap<String, oneshot::Receiver<crate::Result<ForecastResponse>>>>,
    }

    impl GatedForecasts {
        fn expect(&self, point: LatLng) -> oneshot::Sender<crate::Result<ForecastResponse>> {
            let (tx, rx) = oneshot::channel();
            self.gates
                .lock()
                .unwrap()
                .insert(point.format_coordinates(), rx);
            tx
        }
    }

    #[async_trait]
    impl ForecastSource for GatedForecasts {
        fn request_url(&self, point: LatLng) -> String {
            format!("https://forecast.test/compact?lat={}&lon={}", point.lat, point.lon)
        }

        async fn fetch(&self, point: LatLng) -> crate::Result<ForecastResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self
                .gates
                .lock()
                .unwrap()
                .remove(&point.format_coordinates());
            match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(MapError::api("dropped"))),
                None => Ok(forecast_body(14.2)),
            }
        }
    }

    struct FixedWind(Option<serde_json::Value>);

    #[async_trait]
    impl WindSource for FixedWind {
        fn url(&self) -> &str {
            "https://wind.test/wind.json"
        }

        async fn fetch(&self) -> crate::Result<WindField> {
            match &self.0 {
                Some(value) => Ok(serde_json::from_value(value.clone())?),
                None => Err(MapError::api("wind source unreachable")),
            }
        }
    }

    fn app(forecasts: Arc<GatedForecasts>, wind: Option<serde_json::Value>) -> MapApp {
        let mut config = AppConfig::default();
        config.map.time_zone = "UTC".to_string();
        MapApp::with_sources(config, forecasts, Arc::new(FixedWind(wind))).unwrap()
    }

    #[tokio::test]
    async fn test_out_of_region_click_never_fetches() {
        let forecasts = Arc::new(GatedForecasts::default());
        let app = app(forecasts.clone(), None);

        let err = app
            .show_forecast(DEFAULT_CLIENT, LatLng::new(52.52, 13.405), Interaction::Click)
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::OutOfRegion { .. }));
        assert_eq!(forecasts.calls.load(Ordering::SeqCst), 0);

        let notices = app.notices().snapshot();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Alert);
        assert_eq!(notices[0].message, "Bitte innerhalb Österreichs klicken.");
    }

    #[tokio::test]
    async fn test_nan_search_selection_is_rejected() {
        let forecasts = Arc::new(GatedForecasts::default());
        let app = app(forecasts.clone(), None);

        let err = app
            .show_forecast(DEFAULT_CLIENT, LatLng::new(f64::NAN, 11.0), Interaction::Search)
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::OutOfRegion { .. }));
        assert_eq!(app.notices().snapshot()[0].message, "Bitte innerhalb Österreichs suchen.");
        assert_eq!(forecasts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forecast_popup_is_opened() {
        let app = app(Arc::new(GatedForecasts::default()), None);
        let innsbruck = LatLng::new(47.267_222, 11.392_778);

        let outcome = app
            .show_forecast(DEFAULT_CLIENT, innsbruck, Interaction::Click)
            .await
            .unwrap();
        let ForecastOutcome::Shown(popup) = outcome else {
            panic!("expected popup");
        };
        assert!(popup.html.contains("14.2"));
        assert!(popup.html.contains("icons/clearsky_day.svg"));
        assert!(popup.html.contains("Windgeschwindigkeit (km/h): 10"));
        assert_eq!(popup.position, innsbruck);
        assert_eq!(app.forecast_layer().current(DEFAULT_CLIENT), Some(popup));
    }

    #[tokio::test]
    async fn test_rapid_clicks_keep_only_latest_popup() {
        let forecasts = Arc::new(GatedForecasts::default());
        let app = Arc::new(app(forecasts.clone(), None));
        let first_point = LatLng::new(47.0, 11.0);
        let second_point = LatLng::new(48.2, 16.37);
        let release_first = forecasts.expect(first_point);
        let release_second = forecasts.expect(second_point);

        let first = tokio::spawn({
            let app = app.clone();
            async move {
                app.show_forecast(DEFAULT_CLIENT, first_point, Interaction::Click)
                    .await
            }
        });
        while forecasts.calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let app = app.clone();
            async move {
                app.show_forecast(DEFAULT_CLIENT, second_point, Interaction::Click)
                    .await
            }
        });
        while forecasts.calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        release_second.send(Ok(forecast_body(20.5))).unwrap();
        let second = second.await.unwrap().unwrap();
        assert!(matches!(second, ForecastOutcome::Shown(_)));

        release_first.send(Ok(forecast_body(3.1))).unwrap();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, ForecastOutcome::Superseded { .. }));

        let shown = app.forecast_layer().current(DEFAULT_CLIENT).unwrap();
        assert_eq!(shown.position, second_point);
        assert!(shown.html.contains("20.5"));
    }

    #[tokio::test]
    async fn test_pages_keep_their_own_popups() {
        let forecasts = Arc::new(GatedForecasts::default());
        let app = Arc::new(app(forecasts.clone(), None));
        let salzburg = LatLng::new(47.8, 13.04);
        let graz = LatLng::new(47.07, 15.44);
        let release_salzburg = forecasts.expect(salzburg);

        let first_tab = tokio::spawn({
            let app = app.clone();
            async move { app.show_forecast("tab-1", salzburg, Interaction::Click).await }
        });
        while forecasts.calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        let second_tab = app
            .show_forecast("tab-2", graz, Interaction::Click)
            .await
            .unwrap();
        assert!(matches!(second_tab, ForecastOutcome::Shown(_)));

        release_salzburg.send(Ok(forecast_body(9.5))).unwrap();
        let first_tab = first_tab.await.unwrap().unwrap();
        assert!(matches!(first_tab, ForecastOutcome::Shown(_)));

        assert_eq!(app.forecast_layer().current("tab-1").unwrap().position, salzburg);
        assert_eq!(app.forecast_layer().current("tab-2").unwrap().position, graz);
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_toast() {
        let forecasts = Arc::new(GatedForecasts::default());
        let app = app(forecasts.clone(), None);
        let point = LatLng::new(47.5, 13.0);
        forecasts
            .expect(point)
            .send(Err(MapError::api("connection reset")))
            .unwrap();

        let err = app
            .show_forecast(DEFAULT_CLIENT, point, Interaction::Click)
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::Api { .. }));
        assert!(app.forecast_layer().current(DEFAULT_CLIENT).is_none());

        let notices = app.notices().snapshot();
        assert_eq!(notices[0].level, NoticeLevel::Toast);
    }

    #[tokio::test]
    async fn test_load_wind_renders_caption() {
        let app = app(
            Arc::new(GatedForecasts::default()),
            Some(sample_field("2024-01-01T00:00:00Z", 6)),
        );
        app.load_wind().await.unwrap();

        let wind = app.wind_layer().get().await.unwrap();
        assert_eq!(
            wind.valid_time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "2024-01-01T06:00:00Z"
        );
        assert_eq!(
            wind.caption_html,
            r#"(<a href="https://wind.test/wind.json" target="met.no">Stand 01.01.2024, 06:00:00</a>)"#
        );
        assert_eq!(wind.display_options.speed_unit, "km/h");
    }

    #[tokio::test]
    async fn test_wind_failure_is_kept_for_readers() {
        let app = app(Arc::new(GatedForecasts::default()), None);
        assert!(app.load_wind().await.is_err());
        let crate::wind::WindState::Failed(message) = app.wind_layer().settled().await else {
            panic!("expected failed wind layer");
        };
        assert_eq!(message, app.notices().snapshot()[0].message);
    }

    #[tokio::test]
    async fn test_wind_failure_leaves_layer_empty() {
        let app = app(Arc::new(GatedForecasts::default()), None);
        assert!(app.load_wind().await.is_err());
        assert!(!app.wind_layer().is_loaded());
        assert_eq!(app.notices().snapshot()[0].level, NoticeLevel::Toast);
    }

    #[test]
    fn test_parks_are_rendered_at_startup() {
        let app = app(Arc::new(GatedForecasts::default()), None);
        assert_eq!(app.parks().len(), 6);
    }
}
