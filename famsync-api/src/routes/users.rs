/// Profile endpoints
///
/// - `GET /api/v1/users/me` - Current user's profile
/// - `PUT /api/v1/users/me` - Update the current user's profile
///
/// A password change re-hashes the new password after checking it against
/// the policy, and revokes every live refresh token so sessions minted with
/// the old credential die with it.

use crate::{
    app::AppState,
    error::{map_password_policy_errors, map_validation_errors, ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{extract::State, Extension, Json};
use famsync_shared::{
    auth::{middleware::AuthContext, password},
    models::{
        refresh_token::RefreshToken,
        user::{UpdateUser, User, UserSummary},
    },
};
use serde::Deserialize;
use validator::Validate;

/// Profile update request
///
/// All fields optional; only present fields change. `avatar_url` may be set
/// to `null` to clear it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New plaintext password (policy-checked, then hashed)
    pub password: Option<String>,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "crate::routes::users::double_option")]
    pub avatar_url: Option<Option<String>>,
}

pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Returns the authenticated user's profile
pub async fn read_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ApiResponse<UserSummary>>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::new(user.summary(), "Profile fetched")))
}

/// Updates the authenticated user's profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Json<ApiResponse<UserSummary>>> {
    req.validate().map_err(map_validation_errors)?;

    let password_changed = req.password.is_some();

    let password_hash = match &req.password {
        Some(new_password) => {
            password::validate_password_policy(new_password)
                .map_err(map_password_policy_errors)?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let updated = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            avatar_url: req.avatar_url,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if password_changed {
        RefreshToken::revoke_all_for_user(&state.db, auth.user_id).await?;
    }

    Ok(Json(ApiResponse::new(updated.summary(), "Profile updated")))
}
