use axum::{Extension, Router, extract::State, response::Json as ResponseJson, routing::get};
use chrono::Utc;
use db::models::{stats::TaskStats, user::User};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<TaskStats>>, ApiError> {
    let stats = TaskStats::compute(&state.db().pool, user.id, Utc::now().date_naive()).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
