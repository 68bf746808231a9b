//! Integration tests for the wetterkarte HTTP surface
//!
//! The router runs in-process; MET Norway and the wind field source are
//! replaced by a local mock server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wetterkarte::{AppConfig, MapApp, web};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_body() -> Value {
    let step = |time: &str, symbol: &str| {
        json!({
            "time": time,
            "data": {
                "instant": { "details": {
                    "air_pressure_at_sea_level": 1016.2,
                    "air_temperature": 14.2,
                    "cloud_area_fraction": 3.1,
                    "relative_humidity": 51.0,
                    "wind_from_direction": 270.5,
                    "wind_speed": 5.0
                } },
                "next_1_hours": {
                    "summary": { "symbol_code": symbol },
                    "details": { "precipitation_amount": 0.0 }
                }
            }
        })
    };
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [11.3928, 47.2672, 574] },
        "properties": {
            "meta": { "updated_at": "2024-05-01T10:12:43Z" },
            "timeseries": [
                step("2024-05-01T11:00:00Z", "clearsky_day"),
                step("2024-05-01T12:00:00Z", "fair_day"),
                step("2024-05-01T13:00:00Z", "fair_day"),
                step("2024-05-01T14:00:00Z", "cloudy")
            ]
        }
    })
}

fn wind_body() -> Value {
    let header = |number: u8| {
        json!({
            "parameterCategory": 2,
            "parameterNumber": number,
            "refTime": "2024-01-01T00:00:00Z",
            "forecastTime": 6,
            "nx": 2, "ny": 1,
            "lo1": 9.0, "la1": 49.0,
            "dx": 1.0, "dy": 1.0
        })
    };
    json!([
        { "header": header(2), "data": [1.0, 2.0] },
        { "header": header(3), "data": [0.5, -0.5] }
    ])
}

struct TestMap {
    app: Arc<MapApp>,
    router: Router,
    _static_dir: tempfile::TempDir,
}

fn test_map(server: &MockServer) -> TestMap {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<div id=\"map\"></div>").unwrap();

    let mut config = AppConfig::default();
    config.forecast.base_url = server.uri();
    config.forecast.user_agent = "wetterkarte-test/1.0".to_string();
    config.wind.url = format!("{}/wind.json", server.uri());
    config.server.static_dir = static_dir.path().to_string_lossy().to_string();
    config.validate().unwrap();

    let app = Arc::new(MapApp::new(config).unwrap());
    TestMap {
        router: web::app_router(app.clone()),
        app,
        _static_dir: static_dir,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_click_in_austria_returns_popup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locationforecast/2.0/compact"))
        .and(query_param("lat", "47.2672"))
        .and(query_param("lon", "11.3928"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;
    let map = test_map(&server);

    let (status, popup) =
        get_json(&map.router, "/api/forecast?lat=47.267222&lon=11.392778").await;
    assert_eq!(status, StatusCode::OK);

    let html = popup["html"].as_str().unwrap();
    assert!(html.contains("14.2"));
    assert!(html.contains("icons/clearsky_day.svg"));
    assert!(html.contains("Windgeschwindigkeit (km/h): 18"));
    assert!(html.contains("Daten downloaden"));
    assert_eq!(popup["position"]["lat"], 47.267_222);

    let (status, current) = get_json(&map.router, "/api/forecast/current").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["token"], popup["token"]);
}

#[tokio::test]
async fn test_search_outside_austria_is_rejected_without_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locationforecast/2.0/compact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(0)
        .mount(&server)
        .await;
    let map = test_map(&server);

    let (status, body) =
        get_json(&map.router, "/api/forecast?lat=52.52&lon=13.405&origin=search").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["notice"]["level"], "alert");
    assert_eq!(body["notice"]["message"], "Bitte innerhalb Österreichs suchen.");

    let (status, _) = get(&map.router, "/api/forecast/current").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_upstream_failure_becomes_toast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locationforecast/2.0/compact"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let map = test_map(&server);

    let (status, body) = get_json(&map.router, "/api/forecast?lat=47.5&lon=13.0").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["notice"]["level"], "toast");

    let (_, notices) = get_json(&map.router, "/api/notices").await;
    assert_eq!(notices.as_array().unwrap().len(), 1);
    assert_eq!(notices[0]["level"], "toast");
}

#[tokio::test]
async fn test_wind_layer_after_startup_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wind.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wind_body()))
        .expect(1)
        .mount(&server)
        .await;
    let map = test_map(&server);

    let (status, _) = get(&map.router, "/api/wind").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    map.app.load_wind().await.unwrap();

    let (status, wind) = get_json(&map.router, "/api/wind").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wind["valid_time"], "2024-01-01T06:00:00Z");
    assert_eq!(wind["display_options"]["speedUnit"], "km/h");
    assert_eq!(wind["data"][0]["header"]["refTime"], "2024-01-01T00:00:00Z");

    let (status, caption) = get(&map.router, "/api/wind/caption").await;
    assert_eq!(status, StatusCode::OK);
    let caption = String::from_utf8(caption).unwrap();
    // 06:00 UTC is 07:00 in Vienna in winter
    assert!(caption.contains("Stand 01.01.2024, 07:00:00"));
    assert!(caption.contains("/wind.json"));
}

#[tokio::test]
async fn test_wind_request_waits_for_load_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wind.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(wind_body())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let map = test_map(&server);

    let load = map.app.spawn_wind_load();
    let (status, caption) = get(&map.router, "/api/wind/caption").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(caption).unwrap().contains("Stand 01.01.2024"));
    load.await.unwrap();
}

#[tokio::test]
async fn test_failed_wind_load_is_reported_to_the_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wind.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let map = test_map(&server);

    map.app.spawn_wind_load().await.unwrap();

    let (status, body) = get_json(&map.router, "/api/wind").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["notice"]["level"], "toast");
    assert!(
        body["notice"]["message"]
            .as_str()
            .unwrap()
            .contains("nicht geladen")
    );
}

#[tokio::test]
async fn test_each_page_sees_its_own_popup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locationforecast/2.0/compact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;
    let map = test_map(&server);

    let (status, first) =
        get_json(&map.router, "/api/forecast?lat=47.8&lon=13.04&client=page-1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) =
        get_json(&map.router, "/api/forecast?lat=47.07&lon=15.44&client=page-2").await;
    assert_eq!(status, StatusCode::OK);

    let (_, current) = get_json(&map.router, "/api/forecast/current?client=page-1").await;
    assert_eq!(current["token"], first["token"]);
    assert_eq!(current["position"]["lat"], 47.8);
    let (_, current) = get_json(&map.router, "/api/forecast/current?client=page-2").await;
    assert_eq!(current["token"], second["token"]);

    let (status, _) = get(&map.router, "/api/forecast/current?client=page-3").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_parks_config_and_search() {
    let server = MockServer::start().await;
    let map = test_map(&server);

    let (status, parks) = get_json(&map.router, "/api/parks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parks.as_array().unwrap().len(), 6);
    assert!(
        parks[0]["popup_html"]
            .as_str()
            .unwrap()
            .starts_with("<h4>Nationalpark")
    );

    let (_, settings) = get_json(&map.router, "/api/config").await;
    assert_eq!(settings["zoom"], 7);
    assert_eq!(settings["search_provider"], "layer");
    assert_eq!(settings["layers"]["wind"], "ECMWF Windvorhersage");

    let (status, results) = get_json(&map.router, "/api/search?q=kalk").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["label"], "Nationalpark Kalkalpen");
    assert_eq!(results[0]["gated"], true);
}

#[tokio::test]
async fn test_static_page_is_served() {
    let server = MockServer::start().await;
    let map = test_map(&server);

    let (status, body) = get(&map.router, "/index.html").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("id=\"map\""));
}
