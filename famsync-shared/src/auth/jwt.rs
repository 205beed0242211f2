/// Access-token generation and validation
///
/// Access tokens are stateless JWTs signed with HS256 (HMAC-SHA256). A
/// token is valid purely by signature and expiry (no storage lookup), which
/// means an access token cannot be revoked before it naturally expires. The
/// short TTL (30 minutes by default) bounds that exposure; longer-lived
/// sessions go through the persisted, revocable refresh tokens in
/// `models::refresh_token`.
///
/// Claims carry the subject user id, a token-type marker, and the usual
/// iat/exp/iss set. Refresh tokens are NOT JWTs: they are opaque random
/// values, so the only type this module ever mints is `"access"`; the
/// marker exists to reject any foreign token that happens to verify.
///
/// # Example
///
/// ```
/// use famsync_shared::auth::jwt::{create_access_token, validate_access_token};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "test-secret-key-at-least-32-bytes-long";
///
/// let token = create_access_token(user_id, secret, Duration::minutes(30))?;
/// let claims = validate_access_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "famsync";
const TOKEN_TYPE_ACCESS: &str = "access";

/// Error type for access-token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature, format, or issuer check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// The token verified but is not an access token
    #[error("Invalid token type: expected access token")]
    InvalidType,
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "famsync"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token type marker - always "access"
    pub token_type: String,
}

impl Claims {
    /// Creates access-token claims expiring `ttl` from now
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: TOKEN_TYPE_ACCESS.to_string(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed access token for a user
///
/// # Arguments
///
/// * `user_id` - Subject of the token
/// * `secret` - Signing secret (should be at least 32 bytes)
/// * `ttl` - Lifetime of the token
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_access_token(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
) -> Result<String, JwtError> {
    let claims = Claims::new(user_id, ttl);
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, &claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates an access token and extracts its claims
///
/// Verifies the signature, expiry, issuer, and the token-type marker. The
/// distinction between an expired token and a forged one is preserved in the
/// error for server-side logging, but callers at the HTTP boundary collapse
/// both into a single unauthenticated response so the failure mode is not
/// leaked to clients.
///
/// # Errors
///
/// - `JwtError::Expired` if the token is past its expiry
/// - `JwtError::InvalidType` if the type marker is not "access"
/// - `JwtError::ValidationError` for any signature/format/issuer failure
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    if token_data.claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(JwtError::InvalidType);
    }

    Ok(token_data.claims)
}
