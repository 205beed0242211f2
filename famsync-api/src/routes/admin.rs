/// Maintenance triggers
///
/// - `POST /api/v1/admin/reset-routine-tasks` - Flip completed routine
///   tasks back to pending
///
/// The reset also runs best-effort at process startup; periodic execution
/// is left to an external scheduler invoking this endpoint.

use crate::{app::AppState, error::ApiResult, response::ApiResponse};
use axum::{extract::State, Extension, Json};
use famsync_shared::{auth::middleware::AuthContext, models::task::Task};

/// Resets every completed routine task back to pending
///
/// Returns the number of tasks flipped; an immediate second invocation
/// reports zero.
pub async fn reset_routine_tasks(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<u64>>> {
    let count = Task::reset_completed_routines(&state.db).await?;

    Ok(Json(ApiResponse::new(
        count,
        format!("{} routine tasks reset to pending", count),
    )))
}
