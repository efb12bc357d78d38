use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use std::sync::Arc;

use crate::authorizer::TokenAuthorizer;
use crate::config::AppConfig;
use crate::repos::AuthRepo;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repo: Arc<dyn AuthRepo>,
    pub authorizer: TokenAuthorizer,
}

impl AppState {
    pub fn new(config: AppConfig, repo: Arc<dyn AuthRepo>) -> Self {
        let authorizer = TokenAuthorizer::new(repo.clone());
        Self { config, repo, authorizer }
    }
}

pub async fn run() -> anyhow::Result<()> {
    // logging
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let config = AppConfig::load()?;
    tracing::info!(db = %config.db.url, "loaded config");

    let pool = crate::db::sqlite::make_pool(&config.db.url)?;
    {
        let mut conn = pool.get()?;
        crate::db::migrations::run_sqlite_migrations(&mut conn)?;
    }

    let repo: Arc<dyn AuthRepo> = crate::repos::sqlite::SqliteAuthRepo::new(pool);
    let state = AppState::new(config.clone(), repo);
    let app = build_router(state);

    let addr = config.server.bind_addr.clone();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/api/0/installations/{installation_id}/authorizations",
            post(crate::web::handlers::token::authorize),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
