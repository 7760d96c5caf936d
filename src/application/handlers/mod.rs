//! HTTP surface
//!
//! `GET /health` is static. Every other route runs behind principal
//! resolution and the per-principal rate limiter; requests with a refused
//! credential are counted as anonymous before being answered with 401.

pub mod error;
pub mod ideas;
pub mod traders;

use crate::application::state::AppState;
use crate::auth::{reject_invalid_credentials, resolve_principal};
use crate::rate_limit::rate_limit_middleware;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request bodies larger than this are rejected with 413
const MAX_BODY_BYTES: usize = 64 * 1024;

pub async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/ideas", get(ideas::list_ideas).post(ideas::create_idea))
        .route(
            "/ideas/:id",
            get(ideas::get_idea)
                .patch(ideas::update_idea)
                .delete(ideas::delete_idea),
        )
        .route("/ideas/:id/review", post(ideas::review_idea))
        .route("/traders", get(traders::list_traders))
        .route("/traders/:id", get(traders::get_trader))
        .route("/leaderboard", get(traders::leaderboard))
        // Layers run bottom-up: resolve the principal, rate limit by it, then
        // refuse rejected credentials.
        .layer(middleware::from_fn(reject_invalid_credentials))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.resolver.clone(),
            resolve_principal,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
