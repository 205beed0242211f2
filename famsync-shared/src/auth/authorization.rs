/// Authorization guards for family- and task-scoped operations
///
/// FamSync's permission model is membership-based: a user may act on a
/// family's data only while a `family_members` row links them to it, and a
/// handful of mutations additionally require the membership's admin flag.
/// Every task read/update/delete path goes through the task access guard
/// before acting.
///
/// # Example
///
/// ```no_run
/// use famsync_shared::auth::authorization::{require_membership, require_task_access};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
/// # async fn example(pool: PgPool, user_id: Uuid, family_id: Uuid, task_id: Uuid)
/// # -> Result<(), Box<dyn std::error::Error>> {
/// require_membership(&pool, user_id, family_id).await?;
///
/// let task = require_task_access(&pool, user_id, task_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::family::FamilyMember;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the family
    #[error("Not a member of family {0}")]
    NotMember(Uuid),

    /// The operation requires the membership's admin flag
    #[error("Admin rights required for family {0}")]
    AdminRequired(Uuid),

    /// Referenced task does not exist
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Requires that a user belongs to a family
///
/// # Errors
///
/// Returns `AuthzError::NotMember` if no membership row exists
pub async fn require_membership(
    pool: &PgPool,
    user_id: Uuid,
    family_id: Uuid,
) -> Result<(), AuthzError> {
    if !FamilyMember::is_member(pool, user_id, family_id).await? {
        return Err(AuthzError::NotMember(family_id));
    }

    Ok(())
}

/// Requires that a user administers a family
///
/// # Errors
///
/// Returns `AuthzError::AdminRequired` if the user is not an admin of the
/// family (including when they are not a member at all)
pub async fn require_admin(
    pool: &PgPool,
    user_id: Uuid,
    family_id: Uuid,
) -> Result<(), AuthzError> {
    if !FamilyMember::is_admin(pool, user_id, family_id).await? {
        return Err(AuthzError::AdminRequired(family_id));
    }

    Ok(())
}

/// Loads a task together with the caller's access verdict
///
/// Returns `(None, false)` when the task does not exist, otherwise the task
/// paired with whether the user belongs to the task's family. Callers
/// translate `(None, _)` to a not-found failure and `(Some(_), false)` to a
/// forbidden one, [`require_task_access`] does exactly that.
pub async fn check_task_access(
    pool: &PgPool,
    user_id: Uuid,
    task_id: Uuid,
) -> Result<(Option<Task>, bool), sqlx::Error> {
    let Some(task) = Task::find_by_id(pool, task_id).await? else {
        return Ok((None, false));
    };

    let has_access = FamilyMember::is_member(pool, user_id, task.family_id).await?;

    Ok((Some(task), has_access))
}

/// Requires that a task exists and the user may access it
///
/// # Errors
///
/// - `AuthzError::TaskNotFound` if there is no such task
/// - `AuthzError::NotMember` if the user doesn't belong to the task's family
pub async fn require_task_access(
    pool: &PgPool,
    user_id: Uuid,
    task_id: Uuid,
) -> Result<Task, AuthzError> {
    match check_task_access(pool, user_id, task_id).await? {
        (None, _) => Err(AuthzError::TaskNotFound(task_id)),
        (Some(task), false) => Err(AuthzError::NotMember(task.family_id)),
        (Some(task), true) => Ok(task),
    }
}
