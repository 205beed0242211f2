/// Session lifecycle endpoints
///
/// - `POST /api/v1/auth/register` - Create an account
/// - `POST /api/v1/auth/login` - Verify credentials, issue a token pair
/// - `POST /api/v1/auth/refresh` - Rotate the refresh token, mint a new access token
/// - `POST /api/v1/auth/logout` - Revoke the refresh token (idempotent)
/// - `GET  /api/v1/auth/session-check` - Probe access-token validity
///
/// The access token is returned in the JSON body and presented by clients
/// as `Authorization: Bearer <token>`. The refresh token never appears in a
/// JSON body: it travels exclusively in an HTTP-only, SameSite=Strict
/// cookie that login/refresh set and logout clears.
///
/// Login failures are deliberately uniform: unknown email, wrong password,
/// and deactivated account all produce the same 401 body.

use crate::{
    app::AppState,
    error::{map_password_policy_errors, map_validation_errors, ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use famsync_shared::{
    auth::{jwt, password},
    models::{
        refresh_token::RefreshToken,
        user::{CreateUser, User, UserSummary},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Name of the refresh-token cookie
const REFRESH_COOKIE: &str = "refresh_token";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (checked against the password policy)
    pub password: String,

    /// Given name
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    /// Family name
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    /// Optional avatar URL
    #[validate(length(max = 512, message = "Avatar URL must be at most 512 characters"))]
    pub avatar_url: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Token pair returned by login and refresh
///
/// The refresh token is set as a cookie alongside, never serialized here.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token (short-lived, stateless)
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Registers a new user
///
/// # Errors
///
/// - `400`: validation or password-policy failure (all unmet requirements listed)
/// - `409`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    req.validate().map_err(map_validation_errors)?;

    password::validate_password_policy(&req.password).map_err(map_password_policy_errors)?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            avatar_url: req.avatar_url,
        },
    )
    .await?;

    let body = Json(ApiResponse::<UserSummary>::new(
        user.summary(),
        "User registered",
    ));

    Ok((StatusCode::CREATED, body).into_response())
}

/// Logs a user in
///
/// On success issues one access token (body) and one refresh token
/// (HTTP-only cookie, persisted server-side).
///
/// # Errors
///
/// - `401`: invalid credentials (cause not disclosed)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    req.validate().map_err(map_validation_errors)?;

    let invalid_credentials =
        || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    if !user.is_active {
        return Err(invalid_credentials());
    }

    let access_token =
        jwt::create_access_token(user.id, state.secret_key(), state.config.access_ttl())?;
    let refresh_token =
        RefreshToken::issue(&state.db, user.id, state.config.refresh_ttl()).await?;

    let body = Json(ApiResponse::<TokenResponse>::new(
        TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        },
        "Login successful",
    ));

    let cookie = set_refresh_cookie(&refresh_token.token, state.config.refresh_ttl());

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// Rotates the refresh token and mints a new access token
///
/// The presented token is consumed with a compare-and-set: it is revoked
/// only if still live, so a concurrent replay of the same token loses the
/// race and fails. A fresh refresh token replaces it in the cookie.
///
/// # Errors
///
/// - `401`: missing, unknown, revoked, or expired refresh token
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let invalid_token = || ApiError::Unauthorized("Invalid refresh token".to_string());

    let presented = refresh_cookie_value(&headers).ok_or_else(invalid_token)?;

    let consumed = RefreshToken::consume(&state.db, &presented)
        .await?
        .ok_or_else(invalid_token)?;

    let access_token = jwt::create_access_token(
        consumed.user_id,
        state.secret_key(),
        state.config.access_ttl(),
    )?;
    let new_refresh =
        RefreshToken::issue(&state.db, consumed.user_id, state.config.refresh_ttl()).await?;

    let body = Json(ApiResponse::<TokenResponse>::new(
        TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        },
        "Access token refreshed",
    ));

    let cookie = set_refresh_cookie(&new_refresh.token, state.config.refresh_ttl());

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// Logs the user out
///
/// Revokes the refresh token if one is presented and clears the cookie.
/// Always succeeds, logging out twice, or with a stale token, is not an
/// error, and the response never reveals whether the token existed.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(presented) = refresh_cookie_value(&headers) {
        RefreshToken::revoke(&state.db, &presented).await?;
    }

    let body = Json(ApiResponse::message_only("Logged out"));

    Ok(([(header::SET_COOKIE, clear_refresh_cookie())], body).into_response())
}

/// Reports whether the presented access token is valid
///
/// # Errors
///
/// - `401`: missing, malformed, expired, or forged token
pub async fn session_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<()>>> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(famsync_shared::auth::middleware::bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    jwt::validate_access_token(token, state.secret_key())?;

    Ok(Json(ApiResponse::message_only("Session is valid")))
}

/// Builds the Set-Cookie value carrying a refresh token
///
/// HTTP-only and SameSite=Strict: the token is invisible to scripts and is
/// not sent on cross-site requests.
fn set_refresh_cookie(token: &str, ttl: chrono::Duration) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/api/v1/auth; Max-Age={}",
        REFRESH_COOKIE,
        token,
        ttl.num_seconds()
    )
}

/// Builds the Set-Cookie value that clears the refresh cookie
fn clear_refresh_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/api/v1/auth; Max-Age=0",
        REFRESH_COOKIE
    )
}

/// Extracts the refresh token from the request's Cookie header
fn refresh_cookie_value(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == REFRESH_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_set_refresh_cookie_attributes() {
        let cookie = set_refresh_cookie("abc123", chrono::Duration::days(7));
        assert!(cookie.starts_with("refresh_token=abc123;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[test]
    fn test_clear_refresh_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie();
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.starts_with("refresh_token=;"));
    }

    #[test]
    fn test_refresh_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=tok123; lang=en"),
        );

        assert_eq!(refresh_cookie_value(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn test_refresh_cookie_value_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(refresh_cookie_value(&headers), None);

        let empty = HeaderMap::new();
        assert_eq!(refresh_cookie_value(&empty), None);
    }

    #[test]
    fn test_refresh_cookie_value_empty_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("refresh_token=; theme=dark"),
        );
        assert_eq!(refresh_cookie_value(&headers), None);
    }
}
