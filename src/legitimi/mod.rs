//! Server construction and wiring.
//!
//! Builds the shared state (pg pool, credential store, token codec), the
//! router, and the tower layer stack, then serves until ctrl-c.

use crate::cli::globals::GlobalArgs;
use crate::store::{CredentialStore, PostgresStore};
use crate::token::TokenCodec;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;

/// Start the server
///
/// # Errors
///
/// Returns an error if the database connection or the listener fails.
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let store: Arc<dyn CredentialStore> = Arc::new(PostgresStore::new(pool));
    let codec = Arc::new(TokenCodec::new(globals.signing_secret.clone()));

    let app = router(store, codec);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the application router over the injected store and codec.
#[must_use]
pub fn router(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/user/register", post(handlers::register))
        .route("/user/login", post(handlers::login))
        .route("/user/status", get(handlers::account::status))
        .route("/user/modify", post(handlers::account::modify))
        .route("/user/delete", post(handlers::account::delete))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(store))
                .layer(Extension(codec)),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Gracefully shutdown");
    }
}
