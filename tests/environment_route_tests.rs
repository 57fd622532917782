mod common;

use axum::http::StatusCode;
use common::{body_json, json_request, route_uri, send, spawn_app};
use dermis::router::dermis_router;
use dermis::service::environment::EnvironmentService;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoints(server: &MockServer) -> (Url, Url) {
    (
        Url::parse(&format!("{}/aq/currentConditions:lookup", server.uri())).unwrap(),
        Url::parse(&format!("{}/weather/currentConditions:lookup", server.uri())).unwrap(),
    )
}

#[tokio::test]
async fn environment_combines_air_quality_and_weather() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/aq/currentConditions:lookup"))
        .and(query_param("key", "maps-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dateTime": "2026-10-19T08:00:00Z",
            "indexes": [{"code": "uaqi", "displayName": "Universal AQI", "aqi": 64,
                         "category": "Moderate air quality", "dominantPollutant": "pm25"}],
            "pollutants": [{"code": "pm25", "displayName": "PM2.5", "fullName": "Fine particulate matter",
                            "concentration": {"value": 28.4, "units": "MICROGRAMS_PER_CUBIC_METER"}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/currentConditions:lookup"))
        .and(query_param("location.latitude", "18.52"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "temperature": {"degrees": 31.2},
            "relativeHumidity": 58,
            "uvIndex": 6,
            "weatherCondition": {"description": {"text": "Sunny"}},
            "wind": {"speed": {"value": 9}}
        })))
        .mount(&server)
        .await;

    let t = spawn_app(None).await;
    let (aq, weather) = endpoints(&server);
    let env = EnvironmentService::new(reqwest::Client::new(), Some("maps-key".into()))
        .with_endpoints(aq, weather);
    let app = dermis_router(t.state.clone().with_environment(env));

    let resp = send(
        &app,
        json_request(&route_uri("/route.php", "environment"), &json!({"lat": 18.52, "lng": 73.85})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["msg"], "success");
    let result = &body["result"];
    assert_eq!(result["airQuality"]["aqi"], 64);
    assert_eq!(result["airQuality"]["dominantPollutant"], "pm25");
    assert_eq!(result["weather"]["condition"], "Sunny");
    assert_eq!(result["weather"]["humidity"], 58.0);
    assert!(
        result["airQualityText"]
            .as_str()
            .unwrap()
            .starts_with("Air Quality Indexes:\n- Universal AQI: 64 (Moderate air quality)")
    );
}

#[tokio::test]
async fn failed_half_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/aq/currentConditions:lookup"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather/currentConditions:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"relativeHumidity": 80})))
        .mount(&server)
        .await;

    let t = spawn_app(None).await;
    let (aq, weather) = endpoints(&server);
    let env = EnvironmentService::new(reqwest::Client::new(), Some("maps-key".into()))
        .with_endpoints(aq, weather);
    let app = dermis_router(t.state.clone().with_environment(env));

    let resp = send(
        &app,
        json_request(&route_uri("/route.php", "environment"), &json!({"lat": 1.0, "lng": 2.0})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result = body_json(resp).await["result"].clone();
    assert!(result["airQuality"].is_null());
    assert_eq!(result["weather"], json!({"humidity": 80.0}));
    assert_eq!(result["airQualityText"], "Air quality data not available");
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let t = spawn_app(None).await;
    let env = EnvironmentService::new(reqwest::Client::new(), Some("maps-key".into()));
    let app = dermis_router(t.state.clone().with_environment(env));

    let resp = send(
        &app,
        json_request(&route_uri("/route.php", "environment"), &json!({"lat": 123.0, "lng": 2.0})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["notice"], "Invalid coordinates");
}
