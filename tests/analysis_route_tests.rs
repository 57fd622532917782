mod common;

use axum::http::StatusCode;
use common::{
    CookieStore, body_json, form_request, multipart_request, route_uri, send, spawn_app,
    spawn_app_with,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_DETAIL: &str = r#"{"fullName":"Asha Rao","age":29,"gender":"female","skinType":"oily","city":"Pune"}"#;
const IMAGE: &str = "data:application/octet-stream;base64,iVBORw0KGgo=";

#[tokio::test]
async fn missing_fields_are_rejected() {
    let t = spawn_app(None).await;
    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE)],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        json!({"msg": "error", "notice": "Missing required fields: image and user_detail"})
    );
}

#[tokio::test]
async fn invalid_user_detail_is_rejected() {
    let t = spawn_app(None).await;
    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE), ("user_detail", "not-json")],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["notice"], "Invalid user detail format");
}

#[tokio::test]
async fn missing_vision_prompt_is_a_server_error() {
    let server = MockServer::start().await;
    let t = spawn_app(Some(&server.uri())).await;

    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE), ("user_detail", USER_DETAIL)],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["notice"], "Vision prompt not found");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn successful_analysis_returns_html_without_archive_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-5-mini", "max_output_tokens": 5000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "<h2>Overview</h2>"},
                    {"type": "output_text", "text": "<p class=\"final-result-para\">Mild oiliness.</p>"}
                ]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let t = spawn_app(Some(&server.uri())).await;
    t.state.prompts.set("vision", "You are a dermatology assistant.").await.unwrap();

    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[
                ("image", IMAGE),
                ("user_detail", USER_DETAIL),
                ("air_quality", "AQI 42, good"),
            ],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "msg": "success",
            "notice": "Analysis executed successfully",
            "result": "<h2>Overview</h2><p class=\"final-result-para\">Mild oiliness.</p>",
            "fileUrl": null
        })
    );

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["input"][0]["content"], "You are a dermatology assistant.");
    let parts = &sent["input"][1]["content"];
    assert_eq!(
        parts[0]["text"],
        "AQI 42, good\nName: Asha Rao\nAge: 29\nGender: female\nSkin Type: oily"
    );
    assert_eq!(parts[1]["image_url"], "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let t = spawn_app(Some(&server.uri())).await;
    t.state.prompts.set("vision", "inspect").await.unwrap();

    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE), ("user_detail", USER_DETAIL)],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(resp).await["notice"], "API returned HTTP 500");
}

#[tokio::test]
async fn api_error_member_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": null,
            "error": {"message": "image too small"}
        })))
        .mount(&server)
        .await;

    let t = spawn_app(Some(&server.uri())).await;
    t.state.prompts.set("vision", "inspect").await.unwrap();

    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE), ("user_detail", USER_DETAIL)],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(resp).await["notice"], "API Error: image too small");
}

fn vision_reply() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "output": [{"type": "message", "content": [
            {"type": "output_text", "text": "<p class=\"final-result-para\">Balanced skin.</p>"}
        ]}]
    }))
}

#[tokio::test]
async fn multipart_form_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(vision_reply())
        .expect(1)
        .mount(&server)
        .await;

    let t = spawn_app(Some(&server.uri())).await;
    t.state.prompts.set("vision", "inspect").await.unwrap();

    let resp = send(
        &t.app,
        multipart_request(
            &route_uri("/route.php", "analysis"),
            &[
                ("image", IMAGE),
                ("user_detail", USER_DETAIL),
                ("air_quality", r#"{"aqi": 35, "category": "Good"}"#),
            ],
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["result"], "<p class=\"final-result-para\">Balanced skin.</p>");

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user_text = sent["input"][1]["content"][0]["text"].as_str().unwrap();
    assert!(user_text.starts_with("Air Quality Index (AQI): 35\nCategory: Good"));
    assert!(user_text.ends_with("Skin Type: oily"));
}

#[tokio::test]
async fn oversize_multipart_form_is_rejected() {
    let t = spawn_app(None).await;
    let image = format!("data:image/png;base64,{}", "A".repeat(1536 * 1024));

    let resp = send(
        &t.app,
        multipart_request(
            &route_uri("/route.php", "analysis"),
            &[("image", image.as_str()), ("user_detail", USER_DETAIL)],
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body_json(resp).await,
        json!({"msg": "error", "notice": "Request body too large"})
    );
}

#[tokio::test]
async fn rate_limited_upstream_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let t = spawn_app_with(Some(&server.uri()), |cfg| cfg.openai.max_retries = 2).await;
    t.state.prompts.set("vision", "inspect").await.unwrap();

    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE), ("user_detail", USER_DETAIL)],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(resp).await["notice"], "API returned HTTP 429");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn server_errors_are_retried_up_to_the_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let t = spawn_app_with(Some(&server.uri()), |cfg| cfg.openai.max_retries = 2).await;
    t.state.prompts.set("vision", "inspect").await.unwrap();

    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE), ("user_detail", USER_DETAIL)],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(resp).await["notice"], "API returned HTTP 503");
}

#[tokio::test]
async fn undecodable_reply_is_a_json_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let t = spawn_app(Some(&server.uri())).await;
    t.state.prompts.set("vision", "inspect").await.unwrap();

    let resp = send(
        &t.app,
        form_request(
            &route_uri("/route.php", "analysis"),
            &[("image", IMAGE), ("user_detail", USER_DETAIL)],
            &CookieStore::default(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let notice = body_json(resp).await["notice"].as_str().unwrap().to_string();
    assert!(notice.starts_with("JSON Decode Error: "), "{notice}");
}
