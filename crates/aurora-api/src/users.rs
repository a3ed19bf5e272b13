use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::error;

use crate::auth::AppState;

/// Substring search over usernames, in insertion order.
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let db = state.db.clone();
    let matches = tokio::task::spawn_blocking(move || db.search_usernames(&query))
        .await
        .map_err(|e| {
            error!("search task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("search failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(matches))
}
