#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dermis::config::{BootstrapAdmin, Config, MailTransportConfig};
use dermis::db::Storage;
use dermis::handlers::admin::bootstrap_admin;
use dermis::router::{DermisState, dermis_router};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

pub const ADMIN_EMAIL: &str = "admin@dermis.test";
pub const ADMIN_PASSWORD: &str = "Initial123";

pub struct TestApp {
    pub app: Router,
    pub state: DermisState,
    pub mail_dir: PathBuf,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir, openai_base: Option<&str>) -> Config {
    let mut cfg = Config::default();
    cfg.basic.database_url = format!("sqlite://{}", dir.path().join("dermis.sqlite").display());
    cfg.basic.insecure_cookie = true;
    cfg.basic.body_limit_mb = 1;
    cfg.openai.max_retries = 0;
    cfg.openai.requests_per_minute = 10_000;
    if let Some(base) = openai_base {
        cfg.openai.api_key = "sk-test".to_string();
        cfg.openai.base_url = Url::parse(&format!("{base}/v1/")).unwrap();
    }
    cfg.mail.transport = MailTransportConfig::File {
        path: dir.path().join("mails"),
    };
    cfg.bootstrap_admin = Some(BootstrapAdmin {
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        fullname: "Site Admin".to_string(),
    });
    cfg
}

/// Router over a fresh SQLite file. `openai_base` points the OpenAI client at a mock server.
pub async fn spawn_app(openai_base: Option<&str>) -> TestApp {
    spawn_app_with(openai_base, |_| {}).await
}

/// Like [`spawn_app`], with a hook to adjust the config before the state is built.
pub async fn spawn_app_with(openai_base: Option<&str>, configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = test_config(&dir, openai_base);
    configure(&mut cfg);
    let mail_dir = dir.path().join("mails");

    let storage = Storage::connect(&cfg.basic.database_url)
        .await
        .expect("open database");
    let state = DermisState::new(cfg, storage).expect("build state");
    bootstrap_admin(&state).await.expect("seed admin");

    TestApp {
        app: dermis_router(state.clone()),
        state,
        mail_dir,
        _dir: dir,
    }
}

pub fn route_uri(path: &str, route: &str) -> String {
    format!("{path}?type={}", STANDARD.encode(route))
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn form_request(uri: &str, fields: &[(&str, &str)], cookies: &CookieStore) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookies.header() {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_urlencoded::to_string(fields).expect("encode form")))
        .expect("build request")
}

const FORM_BOUNDARY: &str = "----dermis-test-boundary";

/// `multipart/form-data` POST, the encoding the browser wizard uses.
pub fn multipart_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{FORM_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{FORM_BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={FORM_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build request")
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Minimal browser-side cookie jar for following a session across requests.
#[derive(Default)]
pub struct CookieStore(BTreeMap<String, String>);

impl CookieStore {
    pub fn absorb(&mut self, resp: &Response<Body>) {
        for raw in resp.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = raw.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                self.0.remove(name);
            } else {
                self.0.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn header(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
