use dermis::config::Config;
use dermis::db::Storage;
use dermis::handlers::admin::bootstrap_admin;
use dermis::router::{DermisState, dermis_router};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        proxy = %cfg.openai.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.basic.loglevel,
        vision_model = %cfg.openai.vision_model,
        magic_model = %cfg.openai.magic_model,
        google = cfg.google.is_some(),
    );
    if cfg.openai.api_key.is_empty() {
        warn!("openai.api_key is empty; analysis requests will fail");
    }

    let storage = Storage::connect(&cfg.basic.database_url).await?;
    let addr = cfg.basic.listen_addr.clone();

    let state = DermisState::new(cfg, storage)?;
    bootstrap_admin(&state).await?;
    let storage = state.storage.clone();
    let app = dermis_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    storage.close().await;
    info!("database closed");
    Ok(())
}
