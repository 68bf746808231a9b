//! JSON endpoints consumed by the map page

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::app::MapApp;
use crate::config::SearchProvider;
use crate::forecast::{DEFAULT_CLIENT, ForecastOutcome, Interaction, Popup};
use crate::models::LatLng;
use crate::notify::Notice;
use crate::parks::Marker;
use crate::region::Region;
use crate::search::SearchResult;
use crate::wind::{LoadedWind, WindState};
use crate::MapError;

type AppState = Arc<MapApp>;

/// Error body: the notice the page shows to the user
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    notice: Notice,
}

impl ApiError {
    fn new(status: StatusCode, notice: Notice) -> Self {
        Self { status, notice }
    }

    fn from_map_error(err: &MapError, origin: Interaction) -> Self {
        let (status, notice) = match err {
            MapError::OutOfRegion { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Notice::alert(origin.out_of_region_message()),
            ),
            MapError::Api { .. } | MapError::Parse { .. } => {
                (StatusCode::BAD_GATEWAY, Notice::from_error(err))
            }
            MapError::Config { .. } | MapError::Io { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Notice::from_error(err))
            }
        };
        Self::new(status, notice)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Static view settings for the map shell
#[derive(Debug, Serialize, Deserialize)]
pub struct MapSettings {
    pub center: LatLng,
    pub zoom: u8,
    pub region: Region,
    pub search_provider: SearchProvider,
    pub layers: LayerNames,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LayerNames {
    pub forecast: String,
    pub wind: String,
    pub parks: String,
}

impl Default for LayerNames {
    fn default() -> Self {
        Self {
            forecast: "Wettervorhersage MET Norway".to_string(),
            wind: "ECMWF Windvorhersage".to_string(),
            parks: "Nationalparks".to_string(),
        }
    }
}

/// Longest accepted client id; longer ids fall back to the shared default
const MAX_CLIENT_ID_LEN: usize = 64;

fn default_client() -> String {
    DEFAULT_CLIENT.to_string()
}

/// Client id chosen by the page, one per open page
fn client_id(raw: &str) -> &str {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > MAX_CLIENT_ID_LEN {
        DEFAULT_CLIENT
    } else {
        raw
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub origin: Interaction,
    #[serde(default = "default_client")]
    pub client: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    #[serde(default = "default_client")]
    pub client: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/config", get(get_config))
        .route("/forecast", get(get_forecast))
        .route("/forecast/current", get(get_current_forecast))
        .route("/wind", get(get_wind))
        .route("/wind/caption", get(get_wind_caption))
        .route("/parks", get(get_parks))
        .route("/search", get(get_search))
        .route("/notices", get(get_notices))
        .with_state(app)
}

async fn get_config(State(app): State<AppState>) -> Json<MapSettings> {
    let config = app.config();
    Json(MapSettings {
        center: config.map.center(),
        zoom: config.map.zoom,
        region: config.map.region,
        search_provider: config.search.provider,
        layers: LayerNames::default(),
    })
}

async fn get_forecast(
    State(app): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Response, ApiError> {
    let point = LatLng::new(query.lat, query.lon);
    match app
        .show_forecast(client_id(&query.client), point, query.origin)
        .await
    {
        Ok(ForecastOutcome::Shown(popup)) => Ok(Json(popup).into_response()),
        Ok(ForecastOutcome::Superseded { .. }) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => Err(ApiError::from_map_error(&err, query.origin)),
    }
}

async fn get_current_forecast(
    State(app): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> Response {
    match app.forecast_layer().current(client_id(&query.client)) {
        Some(popup) => Json::<Popup>(popup).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn wind_not_loaded() -> ApiError {
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        Notice::toast("Die Winddaten sind nicht verfügbar."),
    )
}

/// The loaded wind field; waits while the startup load is in flight
async fn loaded_wind(app: &MapApp) -> Result<LoadedWind, ApiError> {
    match app.wind_layer().settled().await {
        WindState::Loaded(wind) => Ok(*wind),
        WindState::Failed(message) => Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            Notice::toast(message),
        )),
        WindState::NotRequested | WindState::Loading => Err(wind_not_loaded()),
    }
}

async fn get_wind(State(app): State<AppState>) -> Result<Json<LoadedWind>, ApiError> {
    loaded_wind(&app).await.map(Json)
}

async fn get_wind_caption(State(app): State<AppState>) -> Result<Response, ApiError> {
    let caption = loaded_wind(&app).await?.caption_html;
    Ok((
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        caption,
    )
        .into_response())
}

async fn get_parks(State(app): State<AppState>) -> Json<Vec<Marker>> {
    Json(app.parks().to_vec())
}

async fn get_search(
    State(app): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    app.search(&query.q)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_map_error(&err, Interaction::Search))
}

async fn get_notices(State(app): State<AppState>) -> Json<Vec<Notice>> {
    Json(app.notices().snapshot())
}
