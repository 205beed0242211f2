/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts automatically
/// into the right status code and JSON body.
///
/// Credential-adjacent failures deliberately collapse detail: bad email and
/// bad password both surface the same generic 401, an unknown refresh token
/// and a revoked one are indistinguishable, and internal errors never leak
/// exception text to the client (full detail is traced server-side only).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use famsync_shared::auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), domain-rule violations such as adding a user who
    /// is already a member, or an admin removing themself
    BadRequest(String),

    /// Unauthorized (401), bad credentials, bad/expired tokens
    Unauthorized(String),

    /// Forbidden (403), authenticated but lacking membership or admin right
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email on registration
    Conflict(String),

    /// Validation failure (400) with a structured list of problems
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// Error code (e.g. "unauthorized", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    if constraint == "uq_user_family" {
                        return ApiError::BadRequest(
                            "User is already a member of this family".to_string(),
                        );
                    }
                    if constraint == "uq_tag_name_family" {
                        return ApiError::Conflict(
                            "A tag with this name already exists in the family".to_string(),
                        );
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ApiError::Forbidden("Not a member of this family".to_string())
            }
            AuthzError::AdminRequired(_) => {
                ApiError::Forbidden("This operation requires admin rights".to_string())
            }
            AuthzError::TaskNotFound(_) => ApiError::NotFound("Task not found".to_string()),
            AuthzError::Database(err) => err.into(),
        }
    }
}

/// Convert password errors to API errors
///
/// Hash/verify failures are infrastructure problems, never user input
/// problems, so they map to 500.
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert access-token errors to API errors
///
/// Expired and forged both collapse into the same 401 body.
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        }
    }
}

/// Maps `validator` derive output into a structured validation error
pub fn map_validation_errors(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::ValidationError(details)
}

/// Maps password-policy violations into a structured validation error
///
/// Every unmet requirement is reported, not just the first.
pub fn map_password_policy_errors(violations: Vec<String>) -> ApiError {
    let details = violations
        .into_iter()
        .map(|message| ValidationErrorDetail {
            field: "password".to_string(),
            message,
        })
        .collect();

    ApiError::ValidationError(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_validation_error_display() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_authz_error_mapping() {
        let err: ApiError = AuthzError::TaskNotFound(uuid::Uuid::new_v4()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = AuthzError::NotMember(uuid::Uuid::new_v4()).into();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err: ApiError = AuthzError::AdminRequired(uuid::Uuid::new_v4()).into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_jwt_error_mapping_hides_cause() {
        // Expired and forged must map to the same variant so the boundary
        // can't leak which one happened
        let expired: ApiError = JwtError::Expired.into();
        let forged: ApiError = JwtError::ValidationError("bad signature".to_string()).into();

        match (expired, forged) {
            (ApiError::Unauthorized(a), ApiError::Unauthorized(b)) => assert_eq!(a, b),
            _ => panic!("Both should be Unauthorized with identical messages"),
        }
    }

    #[test]
    fn test_password_policy_mapping_keeps_all_violations() {
        let err = map_password_policy_errors(vec![
            "too short".to_string(),
            "needs a digit".to_string(),
        ]);

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 2);
                assert!(details.iter().all(|d| d.field == "password"));
            }
            _ => panic!("Expected ValidationError"),
        }
    }
}
