pub mod menu;
pub mod recommend;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// All HTTP routes. Any origin may call them; the web frontend is served separately.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/more-like-this", post(recommend::more_like_this))
        .route(
            "/personalized-recommendations",
            post(recommend::personalized_recommendations),
        )
        .route("/api/menu", get(menu::list_menu))
        .route("/api/menu/random", get(menu::random_dish))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
