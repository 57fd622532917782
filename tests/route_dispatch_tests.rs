mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::{body_json, route_uri, send, spawn_app};
use serde_json::json;

#[tokio::test]
async fn unknown_route_type_returns_404_notice() {
    let t = spawn_app(None).await;

    for uri in [
        route_uri("/route.php", "no-such-type"),
        "/route.php".to_string(),
        "/route.php?type=!!!".to_string(),
        route_uri("/adminRoute.php", "analysis"),
    ] {
        let req = Request::builder().uri(&uri).body(Body::empty()).unwrap();
        let resp = send(&t.app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            body_json(resp).await,
            json!({"msg": "error", "notice": "Invalid request type"})
        );
    }
}

#[tokio::test]
async fn feedback_requires_post() {
    let t = spawn_app(None).await;
    let req = Request::builder()
        .uri(route_uri("/route.php", "feedback"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&t.app, req).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analysis_route_returns_413_for_oversized_body() {
    let t = spawn_app(None).await;

    let oversized_image = "a".repeat(1024 * 1024 + 1024);
    let payload = format!("image=data%3Aimage%2Fpng%3Bbase64%2C{oversized_image}&user_detail=%7B%7D");

    let resp = send(
        &t.app,
        Request::builder()
            .method("POST")
            .uri(route_uri("/route.php", "analysis"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(payload))
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(resp).await;
    assert_eq!(body["msg"], "error");
    assert_eq!(body["notice"], "Request body too large");
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let t = spawn_app(None).await;
    let resp = send(
        &t.app,
        Request::builder()
            .method("OPTIONS")
            .uri(route_uri("/route.php", "analysis"))
            .header(header::ORIGIN, "https://skin.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("POST") && methods.contains("OPTIONS"));
}

#[tokio::test]
async fn healthz_is_plain_ok() {
    let t = spawn_app(None).await;
    let resp = send(
        &t.app,
        Request::builder().uri("/healthz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn environment_without_maps_key_is_unavailable() {
    let t = spawn_app(None).await;
    let resp = send(
        &t.app,
        common::json_request(
            &route_uri("/route.php", "environment"),
            &json!({"lat": 18.52, "lng": 73.85}),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(resp).await["notice"],
        "Google Maps API key is not configured"
    );
}
