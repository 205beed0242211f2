/// Tag CRUD
///
/// - `POST   /api/v1/tags` - Create a tag (family members only)
/// - `GET    /api/v1/tags/family/{family_id}` - List a family's tags
/// - `PUT    /api/v1/tags/{tag_id}` - Update a tag
/// - `DELETE /api/v1/tags/{tag_id}` - Delete a tag
///
/// Tag mutations are gated on membership of the tag's family, looked up
/// from the tag row itself so a tag id can't be used to probe another
/// family's data beyond its existence.

use crate::{
    app::AppState,
    error::{map_validation_errors, ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use famsync_shared::{
    auth::{authorization::require_membership, middleware::AuthContext},
    models::tag::{CreateTag, Tag, UpdateTag},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Tag creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 100, message = "Tag name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 20, message = "Color must be at most 20 characters"))]
    pub color: Option<String>,

    pub family_id: Uuid,
}

/// Tag update request
///
/// `color` may be set to `null` to clear it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 100, message = "Tag name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "crate::routes::users::double_option")]
    pub color: Option<Option<String>>,
}

/// Creates a tag in a family the caller belongs to
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<Response> {
    req.validate().map_err(map_validation_errors)?;

    require_membership(&state.db, auth.user_id, req.family_id).await?;

    let tag = Tag::create(
        &state.db,
        CreateTag {
            name: req.name,
            color: req.color,
            family_id: req.family_id,
        },
    )
    .await?;

    let body = Json(ApiResponse::new(tag, "Tag created"));
    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists a family's tags (members only)
pub async fn list_family_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Tag>>>> {
    require_membership(&state.db, auth.user_id, family_id).await?;

    let tags = Tag::list_by_family(&state.db, family_id).await?;

    Ok(Json(ApiResponse::new(tags, "Tags fetched")))
}

/// Updates a tag
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(tag_id): Path<Uuid>,
    Json(req): Json<UpdateTagRequest>,
) -> ApiResult<Json<ApiResponse<Tag>>> {
    req.validate().map_err(map_validation_errors)?;

    let tag = find_accessible_tag(&state, &auth, tag_id).await?;

    let updated = Tag::update(
        &state.db,
        tag.id,
        UpdateTag {
            name: req.name,
            color: req.color,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Ok(Json(ApiResponse::new(updated, "Tag updated")))
}

/// Deletes a tag; its task associations cascade away
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(tag_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Tag>>> {
    let tag = find_accessible_tag(&state, &auth, tag_id).await?;

    Tag::delete(&state.db, tag.id).await?;

    Ok(Json(ApiResponse::new(tag, "Tag deleted")))
}

/// Loads a tag and checks the caller belongs to its family
async fn find_accessible_tag(
    state: &AppState,
    auth: &AuthContext,
    tag_id: Uuid,
) -> ApiResult<Tag> {
    let tag = Tag::find_by_id(&state.db, tag_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    require_membership(&state.db, auth.user_id, tag.family_id).await?;

    Ok(tag)
}
