/// Task CRUD, filtered listings, and subtask creation
///
/// - `POST   /api/v1/tasks` - Create a task (family members only)
/// - `GET    /api/v1/tasks` - Filtered, paginated listing
/// - `GET    /api/v1/tasks/roots` - Root tasks only, each with its direct subtasks
/// - `GET    /api/v1/tasks/with-subtasks/{id}` - One task with its direct subtasks
/// - `GET    /api/v1/tasks/{id}` - One task
/// - `PUT    /api/v1/tasks/{id}` - Partial update
/// - `DELETE /api/v1/tasks/{id}` - Delete (subtasks cascade)
/// - `POST   /api/v1/tasks/{id}/subtasks` - Create one subtask
/// - `POST   /api/v1/tasks/{id}/bulk-subtasks` - Create several subtasks atomically
///
/// Every per-task route goes through the task access guard first: a missing
/// task is 404, a task in a family the caller doesn't belong to is 403.
/// Subtasks always inherit the parent's family, whatever the request says.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    response::{ApiResponse, PaginatedResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::NaiveDate;
use famsync_shared::{
    auth::{
        authorization::{require_membership, require_task_access},
        middleware::AuthContext,
    },
    models::task::{
        CreateSubtask, CreateTask, Task, TaskDetail, TaskFilter, TaskStatus, UpdateTask,
    },
};
use serde::Deserialize;
use uuid::Uuid;

fn default_limit() -> i64 {
    100
}

/// Query parameters for task listings
///
/// All filters combine with AND; `tag_ids` is a comma-separated list of tag
/// UUIDs matched with has-any-of semantics.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// Family whose tasks to list (required)
    pub family_id: Uuid,

    /// Only tasks assigned to this user
    pub assignee_id: Option<Uuid>,

    /// Only tasks in this status
    pub status: Option<TaskStatus>,

    /// Only routine (or only non-routine) tasks
    pub is_routine: Option<bool>,

    /// Only tasks due on or before this date (ISO-8601)
    pub due_before: Option<NaiveDate>,

    /// Only tasks due on or after this date (ISO-8601)
    pub due_after: Option<NaiveDate>,

    /// Comma-separated tag UUIDs
    pub tag_ids: Option<String>,

    /// Pagination offset
    #[serde(default)]
    pub skip: i64,

    /// Pagination limit
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl TaskListQuery {
    /// Converts the query into a filter predicate
    ///
    /// # Errors
    ///
    /// Returns a validation error when `tag_ids` contains a malformed UUID;
    /// malformed input is rejected, never silently dropped.
    fn to_filter(&self) -> ApiResult<TaskFilter> {
        Ok(TaskFilter {
            assignee_id: self.assignee_id,
            status: self.status,
            is_routine: self.is_routine,
            due_before: self.due_before,
            due_after: self.due_after,
            tag_ids: match &self.tag_ids {
                Some(raw) => Some(parse_tag_ids(raw)?),
                None => None,
            },
        })
    }
}

/// Parses a comma-separated list of tag UUIDs
fn parse_tag_ids(raw: &str) -> ApiResult<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: "tag_ids".to_string(),
                    message: format!("'{}' is not a valid UUID", s),
                }])
            })
        })
        .collect()
}

/// Bulk subtask creation request
#[derive(Debug, Deserialize)]
pub struct BulkSubtaskRequest {
    pub subtasks: Vec<CreateSubtask>,
}

/// Creates a task
///
/// The caller must belong to the target family. Tag ids outside the family
/// are dropped without error.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTask>,
) -> ApiResult<Response> {
    require_membership(&state.db, auth.user_id, req.family_id).await?;

    let task = Task::create_with_tags(&state.db, req, auth.user_id).await?;
    let detail = load_detail(&state, task.id).await?;

    let body = Json(ApiResponse::new(detail, "Task created"));
    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists a family's tasks with filters and pagination
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<PaginatedResponse<TaskDetail>>> {
    require_membership(&state.db, auth.user_id, query.family_id).await?;

    let filter = query.to_filter()?;

    let tasks =
        Task::list_by_family(&state.db, query.family_id, &filter, query.limit, query.skip).await?;
    let total = Task::count_by_family(&state.db, query.family_id, &filter).await?;

    let details = TaskDetail::from_tasks(&state.db, tasks).await?;

    Ok(Json(PaginatedResponse::new(
        details,
        "Tasks fetched",
        total,
        query.skip,
        query.limit,
    )))
}

/// Lists a family's root tasks (no parent), each with its direct subtasks
pub async fn list_root_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<PaginatedResponse<TaskDetail>>> {
    require_membership(&state.db, auth.user_id, query.family_id).await?;

    let filter = query.to_filter()?;

    let tasks = Task::list_roots_by_family(
        &state.db,
        query.family_id,
        &filter,
        query.limit,
        query.skip,
    )
    .await?;
    let total = Task::count_roots_by_family(&state.db, query.family_id, &filter).await?;

    let details = TaskDetail::from_tasks(&state.db, tasks).await?;

    Ok(Json(PaginatedResponse::new(
        details,
        "Root tasks fetched",
        total,
        query.skip,
        query.limit,
    )))
}

/// Returns one task with relations
pub async fn read_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    require_task_access(&state.db, auth.user_id, task_id).await?;

    let detail = load_detail(&state, task_id).await?;
    Ok(Json(ApiResponse::new(detail, "Task fetched")))
}

/// Returns one task with its direct subtasks
pub async fn read_task_with_subtasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    require_task_access(&state.db, auth.user_id, task_id).await?;

    let detail = load_detail(&state, task_id).await?;
    Ok(Json(ApiResponse::new(detail, "Task with subtasks fetched")))
}

/// Applies a partial update to a task
///
/// Absent fields stay untouched; explicit nulls clear nullable fields; a
/// present `tag_ids` replaces the whole tag set. The update is atomic.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(patch): Json<UpdateTask>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    let task = require_task_access(&state.db, auth.user_id, task_id).await?;

    // Re-parenting must stay inside the task's family
    if let Some(Some(new_parent_id)) = patch.parent_id {
        if new_parent_id == task.id {
            return Err(ApiError::BadRequest(
                "A task cannot be its own parent".to_string(),
            ));
        }

        let parent = Task::find_by_id(&state.db, new_parent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Parent task not found".to_string()))?;

        if parent.family_id != task.family_id {
            return Err(ApiError::BadRequest(
                "Parent task must belong to the same family".to_string(),
            ));
        }
    }

    Task::update_with_tags(&state.db, &task, patch).await?;

    let detail = load_detail(&state, task_id).await?;
    Ok(Json(ApiResponse::new(detail, "Task updated")))
}

/// Deletes a task; its subtasks and tag associations cascade away
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<TaskDetail>>> {
    require_task_access(&state.db, auth.user_id, task_id).await?;

    // Snapshot the response before the row disappears
    let detail = load_detail(&state, task_id).await?;

    Task::delete(&state.db, task_id).await?;

    Ok(Json(ApiResponse::new(detail, "Task deleted")))
}

/// Creates a subtask under a parent task
///
/// The subtask's family and parent are forced from the parent row.
pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateSubtask>,
) -> ApiResult<Response> {
    let parent = require_task_access(&state.db, auth.user_id, task_id).await?;

    let created = Task::create_subtasks(&state.db, &parent, vec![req], auth.user_id).await?;
    let subtask = created
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::InternalError("Subtask creation returned no row".to_string()))?;

    let detail = load_detail(&state, subtask.id).await?;

    let body = Json(ApiResponse::new(detail, "Subtask created"));
    Ok((StatusCode::CREATED, body).into_response())
}

/// Creates several subtasks under a parent task in one transaction
///
/// Either every subtask is created or none are.
pub async fn create_bulk_subtasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<BulkSubtaskRequest>,
) -> ApiResult<Response> {
    let parent = require_task_access(&state.db, auth.user_id, task_id).await?;

    let created = Task::create_subtasks(&state.db, &parent, req.subtasks, auth.user_id).await?;
    let details = TaskDetail::from_tasks(&state.db, created).await?;

    let body = Json(ApiResponse::new(details, "Subtasks created"));
    Ok((StatusCode::CREATED, body).into_response())
}

/// Loads the full read representation of a task, treating absence as 404
async fn load_detail(state: &AppState, task_id: Uuid) -> ApiResult<TaskDetail> {
    TaskDetail::load(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}
