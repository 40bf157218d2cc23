use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/attendance/:league_id", get(handlers::grid_page))
        .route("/attendance/update", post(handlers::update_attendance))
        .route("/bowlers/verify-tba", post(handlers::verify_tba))
        .route("/api/stats/:league_id", get(handlers::league_stats))
        .with_state(state)
}
