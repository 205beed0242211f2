/// Authentication and authorization utilities
///
/// This module provides the security primitives for FamSync:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and password-policy validation
/// - [`jwt`]: Signed access-token generation and validation
/// - [`middleware`]: Authenticated request context and auth errors
/// - [`authorization`]: Family-membership and task-access guards
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with per-hash random salt
/// - **Access Tokens**: HS256 signing with a short configurable expiration
/// - **Refresh Tokens**: opaque random values, persisted server-side and
///   rotated on every use (see `models::refresh_token`)
///
/// # Example
///
/// ```no_run
/// use famsync_shared::auth::password::{hash_password, verify_password};
/// use famsync_shared::auth::jwt::create_access_token;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = create_access_token(Uuid::new_v4(), "secret-key", Duration::minutes(30))?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
