use crate::api::handlers::{health, reports};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Routes served under `/api`
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/reports", post(reports::generate_report))
        .route("/reports/{run_id}/email", post(reports::email_report))
}

/// Full application router with state attached
pub fn app(state: AppState) -> Router {
    Router::new().nest("/api", create_router()).with_state(state)
}
