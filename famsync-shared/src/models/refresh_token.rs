/// Refresh token model and database operations
///
/// Refresh tokens are opaque random values (64 bytes, hex-encoded) persisted
/// server-side with an expiry and a revoked flag. Unlike access tokens they
/// are stateful and revocable, and they are single-use: every refresh
/// operation consumes the presented token and issues a new one (rotation),
/// so a stolen refresh token can be replayed at most zero times once its
/// legitimate holder has used it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     token VARCHAR(255) NOT NULL UNIQUE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     is_revoked BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Concurrency
///
/// [`RefreshToken::consume`] is a single-statement compare-and-set: it
/// revokes the row only if it is still unrevoked and unexpired, returning
/// the row it flipped. Two concurrent refreshes of the same token therefore
/// race at the storage layer and exactly one wins; the loser observes no
/// row and fails.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Refresh token row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    /// Unique row ID
    pub id: Uuid,

    /// Opaque token value handed to the client (unique)
    pub token: String,

    /// Owning user
    pub user_id: Uuid,

    /// Absolute expiry
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked (logout or rotation)
    pub is_revoked: bool,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

/// Generates a fresh opaque token value
///
/// 64 bytes from the OS RNG, hex-encoded to a 128-character string.
fn generate_token_value() -> String {
    let mut bytes = [0u8; 64];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl RefreshToken {
    /// Issues a new refresh token for a user, valid for `ttl` from now
    pub async fn issue(pool: &PgPool, user_id: Uuid, ttl: Duration) -> Result<Self, sqlx::Error> {
        let token = generate_token_value();
        let expires_at = Utc::now() + ttl;

        let refresh_token = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, is_revoked)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id, token, user_id, expires_at, is_revoked, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(refresh_token)
    }

    /// Atomically consumes a token for rotation
    ///
    /// Revokes the token if (and only if) it exists, is not yet revoked,
    /// and has not expired, returning the consumed row. Returns `None` for
    /// an unknown, already-revoked, or expired token; the caller maps that
    /// to an invalid-refresh-token failure.
    ///
    /// The check and the revoke are one UPDATE, so a token can be consumed
    /// exactly once even under concurrent refresh requests.
    pub async fn consume(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let consumed = sqlx::query_as::<_, RefreshToken>(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE
            WHERE token = $1 AND is_revoked = FALSE AND expires_at > NOW()
            RETURNING id, token, user_id, expires_at, is_revoked, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(consumed)
    }

    /// Revokes a token if present
    ///
    /// Used by logout. Revoking an unknown or already-revoked token is not
    /// an error, logout is idempotent and must not leak token existence.
    ///
    /// # Returns
    ///
    /// True if a row was flipped to revoked, false otherwise
    pub async fn revoke(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = TRUE WHERE token = $1 AND is_revoked = FALSE",
        )
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes every live token belonging to a user
    ///
    /// Called when the user's password changes so stolen sessions die with
    /// the old credential.
    ///
    /// # Returns
    ///
    /// Number of tokens revoked
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = TRUE WHERE user_id = $1 AND is_revoked = FALSE",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Checks if the token is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = generate_token_value();
        assert_eq!(token.len(), 128);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = generate_token_value();
        let b = generate_token_value();
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_expired() {
        let mut token = RefreshToken {
            id: Uuid::new_v4(),
            token: generate_token_value(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::days(7),
            is_revoked: false,
            created_at: Utc::now(),
        };
        assert!(!token.is_expired());

        token.expires_at = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
    }

    // Rotation and replay-rejection tests require a database; see tests/
}
