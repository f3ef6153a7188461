pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;

use axum::{routing::get, Router};
use sqlx::SqlitePool;
use time::Duration;
use axum::http::{header, HeaderValue};
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool` beforehand.
/// This function sets up the session store (and migrates its table), then
/// assembles the HTML pages, the JSON API under `/api`, middleware, and state.
pub async fn build_app(pool: SqlitePool, config: &Config) -> Result<Router, sqlx::Error> {
    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(config.session_days)))
        .with_secure(config.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let state = AppState { db: pool };

    let app = Router::new()
        .route("/health", get(health))
        .merge(routes::pages::router())
        .merge(routes::auth::router())
        .merge(routes::housings::router())
        .merge(routes::bookings::router())
        .merge(routes::reviews::router())
        .merge(routes::history::router())
        .nest("/api", routes::api::router())
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    Ok(app)
}
