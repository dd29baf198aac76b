use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::DishRecord;
use crate::state::AppState;

/// GET /api/menu - The full menu in file order
pub async fn list_menu(State(state): State<AppState>) -> Json<Vec<DishRecord>> {
    Json(state.menu.dishes().to_vec())
}

/// GET /api/menu/random - "I'm feeling lucky"
pub async fn random_dish(
    State(state): State<AppState>,
) -> Result<Json<DishRecord>, (StatusCode, String)> {
    state
        .menu
        .random_pick()
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Menu is empty".to_string()))
}
