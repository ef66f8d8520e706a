use axum::{
    routing::{get, post},
    Router,
};

pub mod boards;
pub mod system;

/// Router for all session-aware endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route(
            "/boards/:board_id/capabilities/:capability",
            get(boards::check_capability),
        )
        .route("/boards/:board_id/roles", post(boards::grant_role))
}
