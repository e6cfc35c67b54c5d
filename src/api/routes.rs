//! Route Definitions

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/:id",
            get(get_session_handler).delete(reset_session_handler),
        )
        .route("/sessions/:id/bets", post(record_bet_handler))
        .route("/sessions/:id/milestones", get(milestones_handler))
        .with_state(state)
}
