/// Authenticated request context
///
/// The API server's authentication middleware validates the bearer token on
/// protected routes and inserts an [`AuthContext`] into the request
/// extensions; handlers extract it with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use famsync_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication context added to request extensions after the bearer
/// token has been validated
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (the access token's subject)
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates an auth context from validated token claims
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for the authentication middleware
///
/// Every variant renders as 401 except the malformed-header case; the body
/// never says whether a presented token was expired or forged.
#[derive(Debug)]
pub enum AuthError {
    /// Missing Authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat(String),

    /// Token validation failed (expired, forged, wrong type)
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string())
            }
        };

        let body = Json(serde_json::json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Extracts the bearer token from an Authorization header value
///
/// # Example
///
/// ```
/// use famsync_shared::auth::middleware::bearer_token;
///
/// assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
/// assert_eq!(bearer_token("Basic dXNlcg=="), None);
/// ```
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer token-value"), Some("token-value"));
        assert_eq!(bearer_token("bearer token-value"), None);
        assert_eq!(bearer_token("token-value"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn test_auth_context_new() {
        let user_id = Uuid::new_v4();
        let ctx = AuthContext::new(user_id);
        assert_eq!(ctx.user_id, user_id);
    }
}
