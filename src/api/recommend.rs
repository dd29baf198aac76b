use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::RecommendError;
use crate::filter::FilterCriteria;
use crate::models::{
    FilterParams, MoreLikeThisRequest, PersonalizedRecommendationRequest, RecommendationResponse,
};
use crate::state::AppState;

/// POST /more-like-this - Dishes similar to one the user clicked
pub async fn more_like_this(
    State(state): State<AppState>,
    Json(req): Json<MoreLikeThisRequest>,
) -> Result<Json<RecommendationResponse>, (StatusCode, String)> {
    recommend(&state, &req.dish_name, req.filters).await
}

/// POST /personalized-recommendations - Dishes matching a free-text preference
pub async fn personalized_recommendations(
    State(state): State<AppState>,
    Json(req): Json<PersonalizedRecommendationRequest>,
) -> Result<Json<RecommendationResponse>, (StatusCode, String)> {
    recommend(&state, &req.preference_query, req.filters).await
}

async fn recommend(
    state: &AppState,
    query: &str,
    filters: Option<FilterParams>,
) -> Result<Json<RecommendationResponse>, (StatusCode, String)> {
    let criteria = filters.map(FilterCriteria::from).unwrap_or_default();

    let recommendation = state
        .recommender
        .recommend_filtered(query, &criteria)
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("Recommendation failed for '{query}': {e}");
            }
            (status, e.to_string())
        })?;

    Ok(Json(RecommendationResponse {
        recommendations: recommendation.ranked,
        top_pick: recommendation.top_pick.map(|r| r.dish),
        notice: recommendation.notice,
    }))
}

fn status_for(e: &RecommendError) -> StatusCode {
    match e {
        RecommendError::EmptyQuery => StatusCode::BAD_REQUEST,
        RecommendError::Index(_) | RecommendError::Rerank(_) => StatusCode::BAD_GATEWAY,
    }
}
