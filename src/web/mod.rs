// HTTP surface — Axum-based JSON API for the intake router (C9), cohort
// engine (C10), and read-only admin views over C2/C10's last output.
//
// Identity is trusted as-is (auth is out of scope): caller-supplied
// addresses are used verbatim as `user_id`.

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cohort::{CohortEngine, CohortSummary};
use crate::db::ScoreStore;
use crate::router::IntakeRouter;

pub mod handlers;
pub mod models;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<IntakeRouter>,
    pub cohort_engine: Arc<CohortEngine>,
    pub store: Arc<dyn ScoreStore>,
    pub last_cohort_summary: Arc<RwLock<Option<CohortSummary>>>,
}

/// Start the Axum server and block until it exits.
pub async fn run_server(
    state: AppState,
    bind_addr: &str,
    port: u16,
) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{bind_addr}:{port}");
    info!("reward-engine listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/submit_action", post(handlers::submit_action))
        .route("/v1/submit_post", post(handlers::submit_post))
        .route("/v1/delete/{post_id}", delete(handlers::delete_post))
        .route(
            "/admin/run-daily-analysis",
            post(handlers::run_daily_analysis),
        )
        .route("/admin/daily-summary", get(handlers::daily_summary))
        .route(
            "/admin/user-activity/{id}",
            get(handlers::user_activity),
        )
        .route(
            "/api/rewards/{category}",
            get(handlers::rewards_for_category),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
