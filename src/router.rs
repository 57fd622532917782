use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::{HeaderValue, Method, header},
    routing::get,
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::api::build_http_client;
use crate::api::openai_client::OpenAiClient;
use crate::config::Config;
use crate::db::Storage;
use crate::error::DermisError;
use crate::handlers::{admin::admin_route, public::public_route};
use crate::service::archive::Archive;
use crate::service::environment::EnvironmentService;
use crate::service::mailer::Mailer;
use crate::service::personalizer::Personalizer;
use crate::service::prompt_store::PromptStore;
use crate::service::vision::VisionService;

#[derive(Clone)]
pub struct DermisState {
    pub cfg: Arc<Config>,
    pub storage: Storage,
    pub prompts: PromptStore,
    pub vision: VisionService,
    pub personalizer: Personalizer,
    pub environment: EnvironmentService,
    pub mailer: Mailer,
    pub archive: Option<Archive>,
    key: Key,
}

impl DermisState {
    pub fn new(cfg: Config, storage: Storage) -> Result<Self, DermisError> {
        let http = build_http_client(
            cfg.openai.proxy.as_ref(),
            Duration::from_secs(cfg.openai.timeout_secs),
        )?;
        let openai = OpenAiClient::new(http.clone(), &cfg.openai)?;
        let prompts = PromptStore::new(
            storage.clone(),
            Duration::from_secs(cfg.prompts.cache_ttl_secs),
        );
        let archive = match cfg.google.as_ref() {
            Some(google) => Archive::from_config(google, http.clone())?,
            None => None,
        };
        let maps_key = cfg.google.as_ref().and_then(|g| g.maps_api_key.clone());

        Ok(Self {
            vision: VisionService::new(openai.clone(), prompts.clone(), cfg.openai.clone()),
            personalizer: Personalizer::new(openai, cfg.openai.clone()),
            environment: EnvironmentService::new(http, maps_key),
            mailer: Mailer::new(&cfg.mail)?,
            key: session_key(&cfg.basic.session_secret)?,
            archive,
            prompts,
            storage,
            cfg: Arc::new(cfg),
        })
    }

    pub fn with_environment(mut self, environment: EnvironmentService) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_archive(mut self, archive: Option<Archive>) -> Self {
        self.archive = archive;
        self
    }

    pub fn secure_cookies(&self) -> bool {
        !self.cfg.basic.insecure_cookie
    }
}

impl FromRef<DermisState> for Key {
    fn from_ref(state: &DermisState) -> Self {
        state.key.clone()
    }
}

fn session_key(secret: &str) -> Result<Key, DermisError> {
    if secret.is_empty() {
        warn!("basic.session_secret is empty; admin sessions will not survive a restart");
        return Ok(Key::generate());
    }
    Key::try_from(secret.as_bytes())
        .map_err(|_| DermisError::NotConfigured("basic.session_secret (64+ bytes)"))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match origin {
        "*" => AllowOrigin::any(),
        other => match HeaderValue::from_str(other) {
            Ok(v) => AllowOrigin::exact(v),
            Err(_) => {
                warn!(origin = other, "invalid cors_origin, allowing any");
                AllowOrigin::any()
            }
        },
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

pub fn dermis_router(state: DermisState) -> Router {
    let body_limit = state.cfg.basic.body_limit_mb * 1024 * 1024;
    let cors = cors_layer(&state.cfg.basic.cors_origin);

    Router::new()
        .route("/route.php", get(public_route).post(public_route))
        .route("/adminRoute.php", get(admin_route).post(admin_route))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
