/// Family CRUD and membership management
///
/// - `POST   /api/v1/families` - Create a family (creator becomes admin)
/// - `GET    /api/v1/families` - List the caller's families
/// - `GET    /api/v1/families/{id}` - Family detail (members only)
/// - `PUT    /api/v1/families/{id}` - Rename (admins only)
/// - `POST   /api/v1/families/{id}/members` - Add a member by email (admins only)
/// - `GET    /api/v1/families/{id}/members` - List members (members only)
/// - `DELETE /api/v1/families/{id}/members/{user_id}` - Remove a member (admins only)
///
/// An admin can never remove themself through this path: memberships carry
/// no admin-reassignment mechanism, so allowing it could strand a family
/// with no admin at all.

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
    auth::{
        authorization::{require_admin, require_membership},
        middleware::AuthContext,
    },
    models::{
        family::{Family, FamilyMember, MemberWithUser},
        user::User,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Family creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFamilyRequest {
    #[validate(length(min = 1, max = 255, message = "Family name must be 1-255 characters"))]
    pub name: String,
}

/// Family rename request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFamilyRequest {
    #[validate(length(min = 1, max = 255, message = "Family name must be 1-255 characters"))]
    pub name: String,
}

fn default_member_role() -> String {
    "other".to_string()
}

/// Add-member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    /// Email of the account to add
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,

    /// Free-text role, e.g. "parent" or "child"
    #[serde(default = "default_member_role")]
    #[validate(length(min = 1, max = 50, message = "Role must be 1-50 characters"))]
    pub role: String,

    /// Whether the new member administers the family
    #[serde(default)]
    pub is_admin: bool,
}

/// Creates a new family
///
/// The creator automatically joins as an admin with role "parent", and the
/// default tag set is seeded, all in one transaction.
pub async fn create_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateFamilyRequest>,
) -> ApiResult<Response> {
    req.validate().map_err(map_validation_errors)?;

    let family = Family::create_with_admin(&state.db, &req.name, auth.user_id).await?;

    let body = Json(ApiResponse::new(family, "Family created"));
    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists the families the caller belongs to
pub async fn list_families(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<Vec<Family>>>> {
    let families = Family::list_by_user(&state.db, auth.user_id).await?;

    Ok(Json(ApiResponse::new(families, "Families fetched")))
}

/// Returns one family's details
///
/// # Errors
///
/// - `404`: no such family
/// - `403`: caller is not a member
pub async fn read_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Family>>> {
    let family = Family::find_by_id(&state.db, family_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Family not found".to_string()))?;

    require_membership(&state.db, auth.user_id, family_id).await?;

    Ok(Json(ApiResponse::new(family, "Family fetched")))
}

/// Renames a family (admins only)
pub async fn update_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Json(req): Json<UpdateFamilyRequest>,
) -> ApiResult<Json<ApiResponse<Family>>> {
    req.validate().map_err(map_validation_errors)?;

    if Family::find_by_id(&state.db, family_id).await?.is_none() {
        return Err(ApiError::NotFound("Family not found".to_string()));
    }

    require_admin(&state.db, auth.user_id, family_id).await?;

    let family = Family::update_name(&state.db, family_id, &req.name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Family not found".to_string()))?;

    Ok(Json(ApiResponse::new(family, "Family updated")))
}

/// Adds a member to a family by email (admins only)
///
/// # Errors
///
/// - `403`: caller is not an admin of the family
/// - `404`: no account with the given email
/// - `400`: the user already belongs to the family
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Response> {
    req.validate().map_err(map_validation_errors)?;

    require_admin(&state.db, auth.user_id, family_id).await?;

    let target = User::find_by_email(&state.db, &req.user_email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user with that email address".to_string()))?;

    if FamilyMember::is_member(&state.db, target.id, family_id).await? {
        return Err(ApiError::BadRequest(
            "User is already a member of this family".to_string(),
        ));
    }

    let member =
        FamilyMember::insert(&state.db, target.id, family_id, &req.role, req.is_admin).await?;

    let body = Json(ApiResponse::new(
        MemberWithUser {
            id: member.id,
            user_id: member.user_id,
            family_id: member.family_id,
            role: member.role,
            is_admin: member.is_admin,
            joined_at: member.joined_at,
            user: target.summary(),
        },
        "Member added",
    ));

    Ok((StatusCode::CREATED, body).into_response())
}

/// Lists a family's members with user profiles (members only)
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<MemberWithUser>>>> {
    require_membership(&state.db, auth.user_id, family_id).await?;

    let members = FamilyMember::list_with_users(&state.db, family_id).await?;

    Ok(Json(ApiResponse::new(members, "Members fetched")))
}

/// Removes a member from a family (admins only)
///
/// # Errors
///
/// - `403`: caller is not an admin
/// - `400`: caller tried to remove themself
/// - `404`: no such membership
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((family_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    require_admin(&state.db, auth.user_id, family_id).await?;

    if auth.user_id == user_id {
        return Err(ApiError::BadRequest(
            "An admin cannot remove themself from the family".to_string(),
        ));
    }

    let removed = FamilyMember::delete(&state.db, user_id, family_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Membership not found".to_string()));
    }

    Ok(Json(ApiResponse::message_only("Member removed")))
}
